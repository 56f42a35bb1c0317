//! `replysplit`: split exported email threads into attributed replies.
//!
//! This crate provides the core library for reading an email CSV export,
//! segmenting each body into reply chunks with inferred senders, grouping
//! them into subject threads, and exporting or submitting a selection.

pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
pub mod store;
pub mod submit;
pub mod thread;
