//! Query classification and multi-corpus retrieval orchestration.
//!
//! The pipeline routes a natural-language legal question to one of three
//! retrieval strategies (section lookup, direct semantic search, scenario
//! decomposition), fans the search out across the five statute corpora,
//! and assembles a grounded answer with act-grouped citations.

pub mod acts;
pub mod chunk;
pub mod classify;
pub mod config;
pub mod expand;
pub mod ingest;
pub mod pipeline;
pub mod respond;
pub mod retrieve;
pub mod scenario;

pub use acts::{Act, detect_acts};
pub use pipeline::{Answer, Pipeline};
