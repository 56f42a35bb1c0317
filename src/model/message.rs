//! Input records and the reply chunks derived from them.

use serde::{Deserialize, Serialize};

use super::address::EmailAddress;

/// One input record from the CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// 1-based data row number in the source file (header excluded).
    pub row: usize,
    /// Display name of the contact (may be empty).
    pub name: String,
    /// Resolved contact address.
    pub email: String,
    /// Thread key; never empty after ingestion.
    pub subject: String,
    /// Full raw body text, possibly with many nested replies.
    pub body: String,
}

/// One contiguous span of a body attributed to a single sender.
///
/// Chunks are produced by [`crate::parser::segment`] and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyChunk {
    /// Inferred sender; never empty.
    pub sender: String,
    /// Trimmed chunk content, including its marker line.
    pub text: String,
    /// Position among the retained chunks of the originating body.
    pub order: usize,
}

/// A chunk flattened together with the record it came from.
///
/// This is the shape every exporter and the submission step consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRow {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub sender: String,
    pub reply: String,
    /// Global position across the whole input, used to keep re-exports stable.
    pub position: usize,
}

impl ReplyRow {
    /// Flatten a record's chunks into rows, numbering them from `start`.
    pub fn from_chunks(message: &RawMessage, chunks: Vec<ReplyChunk>, start: usize) -> Vec<Self> {
        chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| Self {
                name: message.name.clone(),
                email: message.email.clone(),
                subject: message.subject.clone(),
                sender: chunk.sender,
                reply: chunk.text,
                position: start + i,
            })
            .collect()
    }

    /// The sender split into display name and address.
    pub fn sender_address(&self) -> EmailAddress {
        EmailAddress::parse(&self.sender)
    }
}
