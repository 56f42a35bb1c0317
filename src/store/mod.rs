//! Input store: reading exported email CSV files.

pub mod reader;

pub use reader::{load_export, parse_export, LoadedExport};
