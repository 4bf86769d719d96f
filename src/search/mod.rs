//! Search engine adapter, powered by Tantivy.
//!
//! The index, analyzers, query evaluation, faceting and segment storage all
//! belong to Tantivy; this module adapts them to the three operations the
//! service exposes:
//!
//! - **Term search**: query-string grammar, page size 30, HTML snippet
//!   highlighting, `styles` facet over the `state` field
//! - **Geo search**: documents within a radius of an anchor point, with
//!   score explanations
//! - **Conjunction**: term search ∧ geo-distance filter
//!
//! plus the write path: open-or-create bootstrap and atomic batch
//! submission with read-your-writes visibility.

mod document;
mod engine;
mod error;
mod geo;
mod response;
mod schema;

pub use document::{extract_geo, flatten_text};
pub use engine::{DocumentBatch, SearchEngine};
pub use error::{SearchError, SearchResult};
pub use geo::{parse_distance, GeoPoint};
pub use response::{FacetBucket, SearchHit, SearchOutcome};
pub use schema::{build_schema, BrewFields, FieldNames};
