//! Demonstration search service over a beer/brewery JSON corpus.
//!
//! The inverted index, analyzers, query evaluation, faceting and segment
//! storage are delegated to [Tantivy]. This crate only wires together:
//!
//! - **Bootstrap**: open an existing on-disk index, or create a fresh one and
//!   populate it ([`search::SearchEngine::open_or_create`])
//! - **Ingestion**: one-shot, batched bulk load of a directory of JSON files,
//!   running in the background while queries are served ([`ingest`])
//! - **HTTP façade**: three query endpoints (term, geo-distance, term∧geo
//!   conjunction) plus a diagnostics endpoint ([`api`])
//!
//! [Tantivy]: https://github.com/quickwit-oss/tantivy

pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod search;

pub use config::Config;
pub use error::AppError;
