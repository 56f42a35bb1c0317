//! Which threads the user picked for export or submission.

use std::collections::BTreeSet;

use crate::error::{ReplyError, Result};
use crate::model::message::ReplyRow;

use super::ThreadSet;

/// A set of selected thread numbers, bounded by the number of threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    selected: BTreeSet<usize>,
    total: usize,
}

/// How the command line asked for threads.
#[derive(Debug, Clone, Default)]
pub struct SelectionRequest {
    /// Comma-separated numbers and ranges, e.g. `1,3,5-7`.
    pub list: Option<String>,
    /// Select every thread.
    pub all: bool,
    /// Keep only threads matching this search.
    pub search: Option<String>,
}

impl Selection {
    /// Nothing selected.
    pub fn new(total: usize) -> Self {
        Self {
            selected: BTreeSet::new(),
            total,
        }
    }

    /// Select `number` (1-based).
    pub fn select(&mut self, number: usize) -> Result<()> {
        self.check(number)?;
        self.selected.insert(number);
        Ok(())
    }

    /// Select or clear every thread at once.
    pub fn set_all(&mut self, on: bool) {
        if on {
            self.selected = (1..=self.total).collect();
        } else {
            self.selected.clear();
        }
    }

    /// Drop every selected thread `keep` rejects.
    pub fn retain(&mut self, keep: impl Fn(usize) -> bool) {
        self.selected.retain(|&n| keep(n));
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected numbers in ascending order.
    pub fn numbers(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected.iter().copied()
    }

    /// Parse a list such as `1,3,5-7`. Whitespace is ignored.
    pub fn parse_list(list: &str, total: usize) -> Result<Self> {
        let mut selection = Self::new(total);
        for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('-') {
                Some((lo, hi)) => {
                    let lo = parse_number(lo)?;
                    let hi = parse_number(hi)?;
                    if lo > hi {
                        return Err(ReplyError::InvalidSelection(format!(
                            "range '{part}' is reversed"
                        )));
                    }
                    for n in lo..=hi {
                        selection.select(n)?;
                    }
                }
                None => selection.select(parse_number(part)?)?,
            }
        }
        Ok(selection)
    }

    /// Resolve a command-line request against a thread set.
    ///
    /// `all` wins over `list`; a search alone selects every match, and
    /// combined with either it narrows the selection to matches.
    pub fn from_request(set: &ThreadSet, request: &SelectionRequest) -> Result<Self> {
        let mut selection = match (&request.list, request.all) {
            (_, true) => {
                let mut s = Self::new(set.len());
                s.set_all(true);
                s
            }
            (Some(list), false) => Self::parse_list(list, set.len())?,
            (None, false) if request.search.is_some() => {
                let mut s = Self::new(set.len());
                s.set_all(true);
                s
            }
            (None, false) => {
                return Err(ReplyError::InvalidSelection(
                    "no threads selected (use --select, --all or --search)".to_string(),
                ))
            }
        };

        if let Some(query) = &request.search {
            selection.retain(|n| set.get(n).is_some_and(|t| t.matches(query)));
        }

        Ok(selection)
    }

    /// Rows of the selected threads, thread by thread, each in original order.
    pub fn rows<'a>(&self, set: &'a ThreadSet) -> Vec<&'a ReplyRow> {
        self.numbers()
            .filter_map(|n| set.get(n))
            .flat_map(|t| t.rows.iter())
            .collect()
    }

    fn check(&self, number: usize) -> Result<()> {
        if number == 0 || number > self.total {
            return Err(ReplyError::InvalidSelection(format!(
                "thread {number} does not exist (1-{})",
                self.total
            )));
        }
        Ok(())
    }
}

fn parse_number(raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| ReplyError::InvalidSelection(format!("'{}' is not a thread number", raw.trim())))
}
