//! File-backed submitter: appends each case as one JSON line.
//!
//! The queue file is the hand-off to whatever fills in the external intake
//! form; this crate never drives a browser itself.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ReplyError, Result};

use super::{CaseEntry, CaseSubmitter};

/// Writes cases to a JSON-lines queue file.
pub struct QueueSubmitter {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl QueueSubmitter {
    /// Create (or truncate) the queue file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ReplyError::io(parent, e))?;
        }
        let file = File::create(&path).map_err(|e| ReplyError::io(&path, e))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries written so far.
    pub fn written(&self) -> usize {
        self.written
    }
}

impl CaseSubmitter for QueueSubmitter {
    fn submit(&mut self, entry: &CaseEntry) -> Result<()> {
        let line = serde_json::to_string(entry)
            .map_err(|e| ReplyError::Submission(e.to_string()))?;
        writeln!(self.writer, "{line}").map_err(|e| ReplyError::io(&self.path, e))?;
        self.written += 1;
        debug!(path = %self.path.display(), written = self.written, "Queued case");
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| ReplyError::io(&self.path, e))
    }
}
