//! Core data model types: input records, reply chunks, and addresses.

pub mod address;
pub mod message;
