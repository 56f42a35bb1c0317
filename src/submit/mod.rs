//! Case submission: turn selected rows into intake entries and hand them
//! to a [`CaseSubmitter`].
//!
//! A failing entry never stops the batch; it is recorded in the
//! [`SubmissionReport`] and the loop moves on.

pub mod queue;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ReplyError, Result};
use crate::model::message::ReplyRow;

pub use queue::QueueSubmitter;

/// Timestamp format expected by the intake form.
pub const OPENED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// One case to open for a constituent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseEntry {
    pub name: String,
    pub email: String,
    /// The reply text, used as the case details.
    pub details: String,
    pub intake_method: String,
    pub opened_at: String,
}

impl CaseEntry {
    pub fn from_row(row: &ReplyRow, intake_method: &str, opened_at: NaiveDateTime) -> Self {
        Self {
            name: row.name.clone(),
            email: row.email.clone(),
            details: row.reply.trim().to_string(),
            intake_method: intake_method.to_string(),
            opened_at: opened_at.format(OPENED_AT_FORMAT).to_string(),
        }
    }

    /// Reject entries the form would not accept.
    pub fn validate(&self) -> Result<()> {
        if self.details.trim().is_empty() {
            return Err(ReplyError::Submission("case details are empty".to_string()));
        }
        if self.email.trim().is_empty() && self.name.trim().is_empty() {
            return Err(ReplyError::Submission(
                "constituent has neither name nor email".to_string(),
            ));
        }
        Ok(())
    }
}

/// Build one entry per selected row, all stamped with the same time.
pub fn build_entries(
    rows: &[&ReplyRow],
    intake_method: &str,
    opened_at: NaiveDateTime,
) -> Vec<CaseEntry> {
    rows.iter()
        .map(|row| CaseEntry::from_row(row, intake_method, opened_at))
        .collect()
}

/// Something that can open a case for an entry.
pub trait CaseSubmitter {
    /// Submit one entry.
    fn submit(&mut self, entry: &CaseEntry) -> Result<()>;

    /// Called once after the last entry.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// An entry that could not be submitted.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionFailure {
    /// 1-based position in the batch.
    pub index: usize,
    pub name: String,
    pub reason: String,
}

/// Outcome of a batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubmissionReport {
    pub submitted: usize,
    pub failures: Vec<SubmissionFailure>,
}

impl SubmissionReport {
    pub fn attempted(&self) -> usize {
        self.submitted + self.failures.len()
    }
}

/// Submit every entry, continuing past failures.
///
/// The progress callback receives `(current, total)`. An error from
/// [`CaseSubmitter::finish`] is the only one returned.
pub fn submit_all(
    submitter: &mut dyn CaseSubmitter,
    entries: &[CaseEntry],
    progress: &dyn Fn(usize, usize),
) -> Result<SubmissionReport> {
    let total = entries.len();
    let mut report = SubmissionReport::default();

    for (i, entry) in entries.iter().enumerate() {
        progress(i, total);
        let index = i + 1;
        match entry.validate().and_then(|()| submitter.submit(entry)) {
            Ok(()) => {
                info!(index, total, name = %entry.name, "Submitted case");
                report.submitted += 1;
            }
            Err(e) => {
                warn!(index, total, name = %entry.name, error = %e, "Skipping case");
                report.failures.push(SubmissionFailure {
                    index,
                    name: entry.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    progress(total, total);

    submitter.finish()?;
    Ok(report)
}
