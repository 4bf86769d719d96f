use anyhow::Context;
use brew_search::api::{build_router, AppState};
use brew_search::config::Config;
use brew_search::ingest::{self, IngestStats};
use brew_search::search::SearchEngine;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Jemalloc serves the whole process so --memprofile can report real
// allocator statistics.
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brew_search=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    tracing::info!("starting brew-search v{}", env!("CARGO_PKG_VERSION"));

    // The CPU profile spans the ingestion phase: started here, finalized
    // when the background ingestion task completes.
    let profiler = match &config.cpuprofile {
        Some(path) => {
            let guard = pprof::ProfilerGuardBuilder::default()
                .frequency(99)
                .build()
                .context("failed to start CPU profiler")?;
            tracing::info!(path = %path.display(), "CPU profiling enabled");
            Some((guard, path.clone()))
        }
        None => None,
    };

    // Bootstrap: open an existing index, or create a fresh one and schedule
    // ingestion. Completes before the listener binds, so handlers always
    // see a valid engine handle.
    let engine = Arc::new(SearchEngine::open_or_create(&config.index).with_context(|| {
        format!(
            "failed to open or create index at {}",
            config.index.display()
        )
    })?);
    let stats = Arc::new(IngestStats::default());

    if engine.was_created() {
        let engine = engine.clone();
        let stats = stats.clone();
        let json_dir = config.json_dir.clone();
        let batch_size = config.batch_size;
        let memprofile = config.memprofile.clone();
        tokio::spawn(async move {
            match ingest::ingest_dir(&engine, &json_dir, batch_size, &stats).await {
                Ok(summary) => tracing::info!(
                    docs = summary.docs,
                    batches = summary.batches,
                    elapsed_secs = format_args!("{:.2}", summary.elapsed.as_secs_f64()),
                    "ingestion complete"
                ),
                Err(e) => tracing::error!(
                    error = %e,
                    "ingestion failed; continuing to serve whatever was indexed"
                ),
            }
            if let Some((guard, path)) = profiler {
                write_flamegraph(guard, &path);
            }
            if let Some(path) = memprofile {
                write_heap_profile(&path);
            }
        });
    } else if let Some((guard, _)) = profiler {
        // Nothing to ingest, nothing to profile.
        drop(guard);
    }

    let state = AppState::new(engine, stats);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!("listening on http://{}", config.bind);
    axum::serve(listener, app).await.context("HTTP server error")?;

    Ok(())
}

fn write_flamegraph(guard: pprof::ProfilerGuard<'_>, path: &Path) {
    let report = match guard.report().build() {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "failed to build CPU profile report");
            return;
        }
    };
    match std::fs::File::create(path) {
        Ok(file) => {
            if let Err(e) = report.flamegraph(file) {
                tracing::error!(error = %e, "failed to write CPU flamegraph");
            } else {
                tracing::info!(path = %path.display(), "wrote CPU flamegraph");
            }
        }
        Err(e) => tracing::error!(error = %e, "failed to create CPU profile file"),
    }
}

fn write_heap_profile(path: &Path) {
    match try_write_heap_profile(path) {
        Ok(()) => tracing::info!(path = %path.display(), "wrote heap profile"),
        Err(e) => tracing::error!(error = %e, "failed to write heap profile"),
    }
}

/// Dump jemalloc's current heap statistics as JSON.
fn try_write_heap_profile(path: &Path) -> anyhow::Result<()> {
    use tikv_jemalloc_ctl::{epoch, stats};

    // Stats are cached; advancing the epoch refreshes them.
    epoch::advance().map_err(|e| anyhow::anyhow!("epoch advance failed: {e}"))?;
    let read = |r: Result<usize, tikv_jemalloc_ctl::Error>, what: &str| {
        r.map_err(|e| anyhow::anyhow!("reading {what} failed: {e}"))
    };
    let profile = serde_json::json!({
        "allocated_bytes": read(stats::allocated::read(), "stats.allocated")?,
        "active_bytes": read(stats::active::read(), "stats.active")?,
        "resident_bytes": read(stats::resident::read(), "stats.resident")?,
        "mapped_bytes": read(stats::mapped::read(), "stats.mapped")?,
        "metadata_bytes": read(stats::metadata::read(), "stats.metadata")?,
        "retained_bytes": read(stats::retained::read(), "stats.retained")?,
    });
    std::fs::write(path, serde_json::to_vec_pretty(&profile)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_profile_reports_live_allocator_counters() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("heap.json");
        try_write_heap_profile(&path).unwrap();

        let profile: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert!(profile["allocated_bytes"].as_u64().unwrap() > 0);
        assert!(profile["resident_bytes"].as_u64().unwrap() > 0);
    }
}
