//! Input parsing: CSV records, row mapping, and reply segmentation.

pub mod csv;
pub mod row;
pub mod segment;

pub use segment::{extract_replies, segment, Attribution, Diagnostic, Segmentation};
