//! One-shot bulk ingestion of a JSON directory into a fresh index.
//!
//! Runs as a background task concurrent with HTTP serving; the engine alone
//! mediates writer/reader interaction. Ingestion is fail-fast and
//! non-retrying: the first read, parse or submit error terminates the task,
//! previously submitted batches stay searchable, and operators recover by
//! deleting the index directory and restarting.

use crate::search::{SearchEngine, SearchError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Progress log cadence, in documents.
const PROGRESS_EVERY: u64 = 1_000;

/// Errors that terminate an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path} as JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("batch submission failed: {0}")]
    Submit(#[from] SearchError),

    #[error("failed to list {path}: {source}")]
    ListDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// In-process ingestion counters, exposed read-only by `/debug/vars`.
#[derive(Debug, Default)]
pub struct IngestStats {
    docs_indexed: AtomicU64,
    batches_committed: AtomicU64,
    running: AtomicBool,
    last_error: Mutex<Option<String>>,
}

/// Point-in-time copy of [`IngestStats`].
#[derive(Debug, Clone, Serialize)]
pub struct IngestSnapshot {
    pub docs_indexed: u64,
    pub batches_committed: u64,
    pub running: bool,
    pub last_error: Option<String>,
}

impl IngestStats {
    pub fn docs_indexed(&self) -> u64 {
        self.docs_indexed.load(Ordering::Relaxed)
    }

    pub fn batches_committed(&self) -> u64 {
        self.batches_committed.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> IngestSnapshot {
        IngestSnapshot {
            docs_indexed: self.docs_indexed(),
            batches_committed: self.batches_committed(),
            running: self.running.load(Ordering::Relaxed),
            last_error: self
                .last_error
                .lock()
                .ok()
                .and_then(|guard| guard.clone()),
        }
    }

    fn record_error(&self, error: &IngestError) {
        if let Ok(mut guard) = self.last_error.lock() {
            *guard = Some(error.to_string());
        }
    }
}

/// Summary of a completed ingestion run.
#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub docs: u64,
    pub batches: u64,
    pub elapsed: Duration,
}

/// Derive a document identifier from a filename: the name with its final
/// extension removed (`X.json` → `X`, `X.tar.gz` → `X.tar`, `X` → `X`).
pub fn doc_id_for(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Ingest every regular file in `dir` that parses as JSON, in filename
/// order, submitting batches of `batch_size` documents.
pub async fn ingest_dir(
    engine: &SearchEngine,
    dir: &Path,
    batch_size: usize,
    stats: &IngestStats,
) -> Result<IngestSummary, IngestError> {
    stats.running.store(true, Ordering::Relaxed);
    let result = run(engine, dir, batch_size.max(1), stats).await;
    stats.running.store(false, Ordering::Relaxed);
    if let Err(error) = &result {
        stats.record_error(error);
    }
    result
}

async fn run(
    engine: &SearchEngine,
    dir: &Path,
    batch_size: usize,
    stats: &IngestStats,
) -> Result<IngestSummary, IngestError> {
    let list_err = |source| IngestError::ListDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = std::fs::read_dir(dir)
        .map_err(list_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(list_err)?;
    entries.sort_by_key(|entry| entry.file_name());

    tracing::info!(dir = %dir.display(), "indexing");
    let started = Instant::now();
    let mut batch = engine.new_batch();
    let mut count: u64 = 0;

    for entry in entries {
        let path = entry.path();
        let is_file = entry
            .file_type()
            .map_err(|source| IngestError::Read {
                path: path.clone(),
                source,
            })?
            .is_file();
        if !is_file {
            continue;
        }

        let bytes = std::fs::read(&path).map_err(|source| IngestError::Read {
            path: path.clone(),
            source,
        })?;
        let value: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|source| IngestError::Parse {
                path: path.clone(),
                source,
            })?;

        batch.push(doc_id_for(&path), value);
        if batch.len() >= batch_size {
            let full = std::mem::replace(&mut batch, engine.new_batch());
            engine.submit_batch(full).await?;
            stats.batches_committed.fetch_add(1, Ordering::Relaxed);
        }

        count += 1;
        stats.docs_indexed.fetch_add(1, Ordering::Relaxed);
        if count % PROGRESS_EVERY == 0 {
            log_progress(count, started.elapsed());
        }
    }

    if !batch.is_empty() {
        engine.submit_batch(batch).await?;
        stats.batches_committed.fetch_add(1, Ordering::Relaxed);
    }

    let elapsed = started.elapsed();
    log_progress(count, elapsed);
    Ok(IngestSummary {
        docs: count,
        batches: stats.batches_committed(),
        elapsed,
    })
}

fn log_progress(count: u64, elapsed: Duration) {
    let per_doc_ms = if count == 0 {
        0.0
    } else {
        elapsed.as_secs_f64() * 1_000.0 / count as f64
    };
    tracing::info!(
        docs = count,
        elapsed_secs = format_args!("{:.2}", elapsed.as_secs_f64()),
        avg_ms_per_doc = format_args!("{per_doc_ms:.2}"),
        "indexed documents"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_strips_the_final_extension() {
        assert_eq!(doc_id_for(Path::new("X.json")), "X");
        assert_eq!(doc_id_for(Path::new("X")), "X");
        assert_eq!(doc_id_for(Path::new("X.tar.gz")), "X.tar");
        assert_eq!(doc_id_for(Path::new("corpus/brew_1242.json")), "brew_1242");
    }
}
