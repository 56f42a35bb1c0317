//! Subject-based threads over the flattened reply rows.
//!
//! A thread is every row sharing a subject. Threads keep the order in which
//! their subjects first appear and rows keep record order, then chunk order.
//! The set is a pure view: rebuild it whenever the input changes.

pub mod selection;

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::model::message::{RawMessage, ReplyRow};
use crate::parser::segment::{segment, Diagnostic};

pub use selection::{Selection, SelectionRequest};

/// Shown when a thread's first row has no name.
pub const UNKNOWN_NAME: &str = "Unknown";

/// A segmentation warning tied to the input row it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentNote {
    pub row: usize,
    pub diagnostic: Diagnostic,
}

/// Rows produced from a batch of messages.
#[derive(Debug, Default)]
pub struct Flattened {
    pub rows: Vec<ReplyRow>,
    pub notes: Vec<SegmentNote>,
}

/// Segment every message and flatten the chunks into rows.
pub fn flatten(messages: &[RawMessage]) -> Flattened {
    messages.iter().fold(Flattened::default(), |mut acc, message| {
        let seg = segment(&message.body, &message.email);
        acc.notes
            .extend(seg.diagnostics.iter().cloned().map(|diagnostic| SegmentNote {
                row: message.row,
                diagnostic,
            }));
        let start = acc.rows.len();
        acc.rows
            .extend(ReplyRow::from_chunks(message, seg.into_chunks(), start));
        acc
    })
}

/// All rows sharing one subject.
#[derive(Debug, Clone, Serialize)]
pub struct Thread {
    /// 1-based number, stable for a given input.
    pub number: usize,
    pub subject: String,
    pub rows: Vec<ReplyRow>,
}

impl Thread {
    /// Name on the thread's first row.
    pub fn first_name(&self) -> &str {
        match self.rows.first().map(|r| r.name.as_str()) {
            Some(name) if !name.is_empty() => name,
            _ => UNKNOWN_NAME,
        }
    }

    pub fn reply_count(&self) -> usize {
        self.rows.len()
    }

    /// Case-insensitive match of `query` against the first name and subject.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        format!("{} {}", self.first_name(), self.subject)
            .to_lowercase()
            .contains(&query)
    }
}

/// Threads in first-seen subject order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ThreadSet {
    threads: Vec<Thread>,
}

impl ThreadSet {
    /// Group rows by subject.
    pub fn from_rows(rows: impl IntoIterator<Item = ReplyRow>) -> Self {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut threads: Vec<Thread> = Vec::new();

        for row in rows {
            let slot = *index.entry(row.subject.clone()).or_insert_with(|| {
                threads.push(Thread {
                    number: threads.len() + 1,
                    subject: row.subject.clone(),
                    rows: Vec::new(),
                });
                threads.len() - 1
            });
            threads[slot].rows.push(row);
        }

        for thread in &mut threads {
            thread.rows.sort_by_key(|r| r.position);
        }

        debug!(threads = threads.len(), "Grouped rows into threads");
        Self { threads }
    }

    /// Segment, flatten and group in one step, discarding notes.
    pub fn from_messages(messages: &[RawMessage]) -> Self {
        Self::from_rows(flatten(messages).rows)
    }

    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Total rows across all threads.
    pub fn reply_count(&self) -> usize {
        self.threads.iter().map(Thread::reply_count).sum()
    }

    /// Look up a thread by its 1-based number.
    pub fn get(&self, number: usize) -> Option<&Thread> {
        number
            .checked_sub(1)
            .and_then(|idx| self.threads.get(idx))
    }

    /// Threads whose first name or subject contains `query`.
    pub fn search(&self, query: &str) -> Vec<&Thread> {
        self.threads.iter().filter(|t| t.matches(query)).collect()
    }

    /// Return the top N senders by reply count, ties in first-seen order.
    pub fn top_senders(&self, n: usize) -> Vec<(String, usize)> {
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for row in self.threads.iter().flat_map(|t| &t.rows) {
            let count = counts.entry(row.sender.as_str()).or_default();
            if *count == 0 {
                order.push(row.sender.clone());
            }
            *count += 1;
        }
        let mut sorted: Vec<(String, usize)> = order
            .into_iter()
            .map(|s| {
                let c = counts[s.as_str()];
                (s, c)
            })
            .collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted.truncate(n);
        sorted
    }
}
