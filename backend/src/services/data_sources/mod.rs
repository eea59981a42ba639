//! Dataset and template inputs: loading tabular data, extracting template
//! placeholders, and the mapping heuristics that decide which columns feed
//! the signed certificate fields.

pub mod loader;
pub mod mapping;
pub mod placeholders;
