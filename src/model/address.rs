//! Email address parsing and discovery in free text.

use std::sync::LazyLock;

use regex::Regex;

/// Loose address pattern used to discover addresses inside body text.
static ADDRESS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid address regex")
});

/// A parsed email address.
///
/// # Examples
/// - `"Jane Doe <jane@example.com>"` → `display_name = "Jane Doe"`, `address = "jane@example.com"`
/// - `"user@example.com"` → `display_name = ""`, `address = "user@example.com"`
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The bare email address (`user@domain`).
    pub address: String,
}

impl EmailAddress {
    /// Build an address from its parts, trimming both.
    pub fn new(display_name: &str, address: &str) -> Self {
        Self {
            display_name: strip_quotes(display_name),
            address: address.trim().to_string(),
        }
    }

    /// Parse a single address from a sender string.
    ///
    /// Supported formats:
    /// - `"user@domain.com"`
    /// - `"<user@domain.com>"`
    /// - `"Display Name <user@domain.com>"`
    /// - `"\"Display, Name\" <user@domain.com>"`
    ///
    /// Anything else is stored verbatim as `address`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let Some(angle_start) = trimmed.rfind('<') {
            if let Some(angle_end) = trimmed.rfind('>') {
                if angle_end > angle_start {
                    return Self::new(
                        &trimmed[..angle_start],
                        &trimmed[angle_start + 1..angle_end],
                    );
                }
            }
        }

        Self {
            display_name: String::new(),
            address: trimmed.to_string(),
        }
    }

    /// Find the first thing that looks like an email address in `text`.
    pub fn find_in_text(text: &str) -> Option<String> {
        ADDRESS_REGEX.find(text).map(|m| m.as_str().to_string())
    }

    /// Format for display: `"Display Name <address>"` or just `"address"`.
    pub fn display(&self) -> String {
        if self.display_name.is_empty() {
            self.address.clone()
        } else {
            format!("{} <{}>", self.display_name, self.address)
        }
    }
}

/// Strip surrounding double-quotes and trim whitespace.
fn strip_quotes(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
