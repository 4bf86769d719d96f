pub mod handlers;
pub mod routes;

pub use routes::build_router;

use crate::ingest::IngestStats;
use crate::search::SearchEngine;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state.
///
/// The engine mediates its own reader/writer concurrency, so no locks
/// appear at this level.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub ingest: Arc<IngestStats>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(engine: Arc<SearchEngine>, ingest: Arc<IngestStats>) -> Self {
        Self {
            engine,
            ingest,
            started_at: Instant::now(),
        }
    }
}
