//! Reply segmentation: split an email body into chunks attributed to senders.
//!
//! A body is cut at every line that introduces an embedded message:
//!
//! - a `From:` header line,
//! - an inline quote introduction (`On <anything> wrote:`),
//! - an `-----Original Message-----` separator.
//!
//! Markers are matched case-insensitively at the start of a line and stay
//! attached to the segment they introduce. Segments with fewer than two
//! content lines are dropped as noise. The first retained segment belongs
//! to the fallback sender; later ones take an explicit `From:` value, then
//! the name and address of a quote introduction, then the previous chunk's
//! sender.
//!
//! Segmentation is total: any string produces a (possibly empty) result and
//! problems are reported as [`Diagnostic`]s, never as errors.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::address::EmailAddress;
use crate::model::message::ReplyChunk;

/// Sender used when the caller supplies a blank fallback.
pub const UNKNOWN_SENDER: &str = "Unknown";

/// Segments need at least this many non-blank content lines to be kept.
const MIN_CONTENT_LINES: usize = 2;

const SEPARATOR: &str = "-----original message-----";

/// A quote introduction occupying one whole line, e.g.
/// `On Mon, Jan 1, 2024 at 9:00 AM John Smith <john@x.com> wrote:`.
static QUOTE_INTRO_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^on .+? wrote:").expect("valid quote line regex"));

/// First `From:` header inside a segment. The value stays on its own line.
static FROM_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^from:[ \t]*(.*)").expect("valid from header regex"));

/// Quote introduction with a trailing angle-bracketed address.
///
/// Group 1 is the date and name prefix, group 2 the address.
static QUOTE_INTRO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bon\s+([^<\n]+?)\s*<([^<>\n]+)>\s*wrote:").expect("valid quote regex")
});

/// Date and time tokens that separate the date from the name in a quote prefix.
static DATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\d{1,2}:\d{2}(?::\d{2})?(?:\s*[ap]\.?m\b\.?)?|\d{1,2}/\d{1,2}/\d{2,4}|\d{4}-\d{2}-\d{2}|\b\d{4}\b",
    )
    .expect("valid date token regex")
});

/// How a chunk's sender was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribution {
    /// First chunk of the body: the record's own contact.
    Fallback,
    /// An explicit `From:` header inside the chunk.
    Header,
    /// An `On ... <address> wrote:` introduction inside the chunk.
    QuoteIntro,
    /// Nothing found; carried over from the previous chunk.
    Inherited,
}

/// A soft warning produced while segmenting. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A segment was discarded because it had too few content lines.
    DroppedSegment { line: usize, content_lines: usize },
    /// A chunk had no attribution of its own.
    InheritedSender { order: usize, sender: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DroppedSegment {
                line,
                content_lines,
            } => write!(
                f,
                "segment at line {line} dropped: {content_lines} content line(s)"
            ),
            Self::InheritedSender { order, sender } => {
                write!(f, "chunk {order} inherited sender '{sender}'")
            }
        }
    }
}

/// An attributed chunk together with how its sender was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributedChunk {
    #[serde(flatten)]
    pub chunk: ReplyChunk,
    pub attribution: Attribution,
}

/// Result of segmenting one body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segmentation {
    /// Chunks in body order.
    pub chunks: Vec<AttributedChunk>,
    /// Soft warnings, in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl Segmentation {
    /// Drop attribution details and diagnostics, keeping only the chunks.
    pub fn into_chunks(self) -> Vec<ReplyChunk> {
        self.chunks.into_iter().map(|c| c.chunk).collect()
    }
}

/// Classification of a single body line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Blank,
    FromHeader,
    QuoteIntro,
    Separator,
    Content,
}

impl LineKind {
    fn starts_segment(self) -> bool {
        matches!(self, Self::FromHeader | Self::QuoteIntro | Self::Separator)
    }
}

/// A slice of the body between two marker lines.
struct RawSegment<'a> {
    text: &'a str,
    /// 1-based line number of the first line within the trimmed body.
    line: usize,
}

/// Split `body` into reply chunks, using `fallback_sender` for the first one.
pub fn segment(body: &str, fallback_sender: &str) -> Segmentation {
    let fallback = match fallback_sender.trim() {
        "" => UNKNOWN_SENDER,
        s => s,
    };

    split_segments(body.trim())
        .into_iter()
        .fold(Segmentation::default(), |mut acc, raw| {
            let text = raw.text.trim();
            let content_lines = content_line_count(text);
            if content_lines < MIN_CONTENT_LINES {
                debug!(line = raw.line, content_lines, "Dropping short segment");
                acc.diagnostics.push(Diagnostic::DroppedSegment {
                    line: raw.line,
                    content_lines,
                });
                return acc;
            }

            let order = acc.chunks.len();
            let (sender, attribution) = match acc.chunks.last() {
                // The first kept chunk takes the fallback even when it opens
                // with a marker. If a short greeting before `On ... wrote:`
                // was dropped, the quoted author loses the attribution.
                None => (fallback.to_string(), Attribution::Fallback),
                Some(previous) => infer_sender(text)
                    .unwrap_or_else(|| (previous.chunk.sender.clone(), Attribution::Inherited)),
            };

            if attribution == Attribution::Inherited {
                debug!(order, sender = %sender, "Chunk inherits previous sender");
                acc.diagnostics.push(Diagnostic::InheritedSender {
                    order,
                    sender: sender.clone(),
                });
            }

            acc.chunks.push(AttributedChunk {
                chunk: ReplyChunk {
                    sender,
                    text: text.to_string(),
                    order,
                },
                attribution,
            });
            acc
        })
}

/// Split `body` into reply chunks, discarding diagnostics.
pub fn extract_replies(body: &str, fallback_sender: &str) -> Vec<ReplyChunk> {
    segment(body, fallback_sender).into_chunks()
}

/// Cut the body before every marker line. No text is lost or reordered.
fn split_segments(body: &str) -> Vec<RawSegment<'_>> {
    let mut segments = Vec::new();
    if body.is_empty() {
        return segments;
    }

    let mut start = 0;
    let mut start_line = 1;
    let mut offset = 0;

    for (idx, line) in body.split_inclusive('\n').enumerate() {
        if offset > start && classify(line).starts_segment() {
            segments.push(RawSegment {
                text: &body[start..offset],
                line: start_line,
            });
            start = offset;
            start_line = idx + 1;
        }
        offset += line.len();
    }

    segments.push(RawSegment {
        text: &body[start..],
        line: start_line,
    });
    segments
}

fn classify(line: &str) -> LineKind {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        LineKind::Blank
    } else if starts_with_ignore_case(line, "from:") {
        LineKind::FromHeader
    } else if starts_with_ignore_case(line, SEPARATOR) {
        LineKind::Separator
    } else if QUOTE_INTRO_LINE.is_match(line) {
        LineKind::QuoteIntro
    } else {
        LineKind::Content
    }
}

fn starts_with_ignore_case(line: &str, prefix: &str) -> bool {
    line.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Count non-blank lines, not counting a leading separator line.
///
/// The separator is pure punctuation; `From:` and quote lines do count
/// because they carry the sender.
fn content_line_count(text: &str) -> usize {
    let mut kinds = text.lines().map(classify).peekable();
    if kinds.peek() == Some(&LineKind::Separator) {
        kinds.next();
    }
    kinds.filter(|k| *k != LineKind::Blank).count()
}

/// Header first, then quote introduction.
fn infer_sender(text: &str) -> Option<(String, Attribution)> {
    header_sender(text)
        .map(|s| (s, Attribution::Header))
        .or_else(|| quote_sender(text).map(|s| (s, Attribution::QuoteIntro)))
}

fn header_sender(text: &str) -> Option<String> {
    let value = FROM_HEADER.captures(text)?.get(1)?.as_str().trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn quote_sender(text: &str) -> Option<String> {
    let caps = QUOTE_INTRO.captures(text)?;
    let prefix = caps.get(1)?.as_str();
    let address = caps.get(2)?.as_str().trim();
    if address.is_empty() {
        return None;
    }
    Some(EmailAddress::new(name_after_date(prefix), address).display())
}

/// Strip the date and time from a quote prefix, leaving the name.
///
/// Without a recognizable date the first word is taken as the date.
fn name_after_date(prefix: &str) -> &str {
    let rest = match DATE_TOKEN.find_iter(prefix).last() {
        Some(m) => &prefix[m.end()..],
        None => prefix
            .trim()
            .split_once(char::is_whitespace)
            .map_or("", |(_, rest)| rest),
    };
    let rest = rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
    let rest = match rest.get(..3) {
        Some(head) if head.eq_ignore_ascii_case("at ") => &rest[3..],
        _ => rest,
    };
    rest.trim_matches(|c: char| c == ',' || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn senders(seg: &Segmentation) -> Vec<&str> {
        seg.chunks.iter().map(|c| c.chunk.sender.as_str()).collect()
    }

    fn texts(seg: &Segmentation) -> Vec<&str> {
        seg.chunks.iter().map(|c| c.chunk.text.as_str()).collect()
    }

    #[test]
    fn test_classify_markers() {
        assert_eq!(classify("From: a@b.com\n"), LineKind::FromHeader);
        assert_eq!(classify("FROM:a@b.com"), LineKind::FromHeader);
        assert_eq!(classify("-----Original Message-----\r\n"), LineKind::Separator);
        assert_eq!(
            classify("On Tue, Bob <b@x.com> wrote:"),
            LineKind::QuoteIntro
        );
        assert_eq!(classify("   "), LineKind::Blank);
        assert_eq!(classify("From someone"), LineKind::Content);
        assert_eq!(classify(" From: indented"), LineKind::Content);
        assert_eq!(classify("Once upon a time"), LineKind::Content);
    }

    #[test]
    fn test_header_scenario() {
        let body =
            "Hello,\nThanks.\n\nFrom: Jane Doe <jane@example.com>\nSent: Monday\n\nSee attached.";
        let seg = segment(body, "recipient@nyc.gov");
        assert_eq!(
            senders(&seg),
            vec!["recipient@nyc.gov", "Jane Doe <jane@example.com>"]
        );
        assert_eq!(
            texts(&seg),
            vec![
                "Hello,\nThanks.",
                "From: Jane Doe <jane@example.com>\nSent: Monday\n\nSee attached."
            ]
        );
        assert_eq!(seg.chunks[1].attribution, Attribution::Header);
    }

    #[test]
    fn test_quote_intro_scenario() {
        let body =
            "Hi\n\nOn Mon, Jan 1, 2024 at 9:00 AM John Smith <john@x.com> wrote:\n> original text\n> more";
        let seg = segment(body, "r@nyc.gov");
        assert_eq!(seg.chunks.len(), 1, "lone 'Hi' is a single-line segment");

        let body = "Hi there\nThanks\n\nOn Mon, Jan 1, 2024 at 9:00 AM John Smith <john@x.com> wrote:\n> original text\n> more";
        let seg = segment(body, "r@nyc.gov");
        assert_eq!(senders(&seg), vec!["r@nyc.gov", "John Smith <john@x.com>"]);
        assert_eq!(seg.chunks[1].attribution, Attribution::QuoteIntro);
    }

    #[test]
    fn test_separator_with_single_line_dropped() {
        let seg = segment("-----Original Message-----\nFrom someone", "r@nyc.gov");
        assert!(seg.chunks.is_empty());
        assert_eq!(
            seg.diagnostics,
            vec![Diagnostic::DroppedSegment {
                line: 1,
                content_lines: 1
            }]
        );
    }

    #[test]
    fn test_inherits_previous_sender() {
        let body = "Start\nof thread\nFrom: Jane Doe <jane@example.com>\nFirst reply\n-----Original Message-----\nNo header here\nat all";
        let seg = segment(body, "r@nyc.gov");
        assert_eq!(
            senders(&seg),
            vec![
                "r@nyc.gov",
                "Jane Doe <jane@example.com>",
                "Jane Doe <jane@example.com>"
            ]
        );
        assert_eq!(seg.chunks[2].attribution, Attribution::Inherited);
        assert!(seg.diagnostics.contains(&Diagnostic::InheritedSender {
            order: 2,
            sender: "Jane Doe <jane@example.com>".to_string()
        }));
    }

    #[test]
    fn test_header_beats_quote_intro() {
        let body = "a\nb\nFrom: Header Person <h@x.com>\nOn Mon, Jan 1, 2024 at 9:00 AM Quote Person <q@x.com> wrote:\n> text";
        let seg = segment(body, "r@nyc.gov");
        // The quote line starts its own segment; the lone From: line is dropped.
        assert_eq!(seg.chunks.len(), 2);
        assert_eq!(seg.chunks[1].chunk.sender, "Quote Person <q@x.com>");

        let body = "a\nb\nFrom: Header Person <h@x.com>\nwrote earlier: On Mon, 2024 Quote <q@x.com> wrote:";
        let seg = segment(body, "r@nyc.gov");
        assert_eq!(seg.chunks[1].chunk.sender, "Header Person <h@x.com>");
    }

    #[test]
    fn test_body_starting_with_marker_uses_fallback() {
        let body = "From: Someone Else <else@x.com>\nSubject: hi\n\nbody";
        let seg = segment(body, "r@nyc.gov");
        assert_eq!(senders(&seg), vec!["r@nyc.gov"]);
    }

    #[test]
    fn test_empty_and_whitespace_bodies() {
        assert!(segment("", "r@nyc.gov").chunks.is_empty());
        assert!(segment("  \n\t\n ", "r@nyc.gov").chunks.is_empty());
        assert!(segment("one line only", "r@nyc.gov").chunks.is_empty());
    }

    #[test]
    fn test_blank_fallback_becomes_unknown() {
        let seg = segment("line one\nline two", "   ");
        assert_eq!(senders(&seg), vec![UNKNOWN_SENDER]);
    }

    #[test]
    fn test_empty_from_value_falls_through() {
        let body = "a\nb\nFrom:   \nso, on 3/4/2024, Ann Lee <ann@x.com> wrote:";
        let seg = segment(body, "r@nyc.gov");
        assert_eq!(senders(&seg), vec!["r@nyc.gov", "Ann Lee <ann@x.com>"]);
        assert_eq!(seg.chunks[1].attribution, Attribution::QuoteIntro);
    }

    #[test]
    fn test_crlf_body() {
        let body = "Hello,\r\nThanks.\r\n\r\nFrom: Jane Doe <jane@example.com>\r\nSent: Monday\r\n";
        let seg = segment(body, "r@nyc.gov");
        assert_eq!(seg.chunks.len(), 2);
        assert_eq!(seg.chunks[1].chunk.sender, "Jane Doe <jane@example.com>");
        assert_eq!(seg.chunks[0].chunk.text, "Hello,\r\nThanks.");
    }

    #[test]
    fn test_name_after_date() {
        assert_eq!(
            name_after_date("Mon, Jan 1, 2024 at 9:00 AM John Smith"),
            "John Smith"
        );
        assert_eq!(name_after_date("Jan 1, 2024, at 9:00 a.m., Ann"), "Ann");
        assert_eq!(name_after_date("12/01/2024 Amy Smith"), "Amy Smith");
        assert_eq!(name_after_date("Tue, 5 Mar 2024 14:05 Amy Poe"), "Amy Poe");
        assert_eq!(name_after_date("Tuesday Jane"), "Jane");
        assert_eq!(name_after_date("2024-01-01"), "");
    }

    #[test]
    fn test_quote_without_name_gives_bare_address() {
        assert_eq!(
            quote_sender("On 2024-01-01 <a@b.com> wrote:").as_deref(),
            Some("a@b.com")
        );
    }

    #[test]
    fn test_multiple_angle_groups_not_attributed() {
        assert_eq!(
            quote_sender("On Mon, 2024 Ann <a@x.com> cc Bob <b@x.com> wrote:"),
            None
        );
    }

    #[test]
    fn test_marker_led_first_chunk_keeps_fallback() {
        let body = "Hi\n\nOn Mon, Jan 1, 2024 at 9:00 AM John Smith <john@x.com> wrote:\n> original text\n> more";
        let seg = segment(body, "r@nyc.gov");
        assert_eq!(senders(&seg), vec!["r@nyc.gov"]);
        assert_eq!(seg.chunks[0].attribution, Attribution::Fallback);
        assert!(texts(&seg)[0].starts_with("On Mon"));
    }
}
