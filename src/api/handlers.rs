//! HTTP handlers for the query façade.

use crate::api::AppState;
use crate::error::Result;
use crate::search::{parse_distance, GeoPoint};
use axum::{
    extract::{Path, State},
    response::Html,
    Json,
};
use serde_json::json;
use std::fmt::Write;

/// Fixed demo anchor point (Palo Alto, CA).
const ANCHOR: GeoPoint = GeoPoint::new(-122.107799, 37.399285);

/// Radius for the anchor-only geo search; effectively the whole globe.
const GLOBE_RADIUS: &str = "100000mi";

/// Radius for the conjunction geo filter.
const NEARBY_RADIUS: &str = "100mi";

const LANDING_PAGE: &str = "<html><center>brew-search demo</center><br>\
Term search: <a href=./search/brew>/search/brew</a><br>\
Geo search: <a href=./geosearch/>/geosearch/</a><br>\
Conjunction geo: <a href=./geosearch/brew>/geosearch/brew</a><br>\
Diagnostics: <a href=./debug/vars>/debug/vars</a></html>";

/// Static landing page listing the endpoints.
pub async fn landing() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

/// Term search with faceting: `GET /search/{term}`.
pub async fn term_search(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Result<String> {
    let outcome = state.engine.term_search(&term)?;
    tracing::info!(%term, hits = outcome.total, "term search");

    let mut body = String::new();
    if let Some(top) = outcome.facets.first() {
        let _ = writeln!(body, "Facets:");
        let _ = writeln!(body, "{} ({})", top.term, top.count);
    }
    let _ = write!(body, "\n\nResults for: {term}\n\n{outcome}");
    Ok(body)
}

/// Records around the fixed anchor: `GET /geosearch/`.
pub async fn geo_search(State(state): State<AppState>) -> Result<String> {
    let radius_m = parse_distance(GLOBE_RADIUS)?;
    let outcome = state.engine.geo_search(ANCHOR, radius_m)?;
    tracing::info!(hits = outcome.total, "geo search");
    Ok(format!(
        "\n\nSearch for records around a geo point:\n\n{outcome}"
    ))
}

/// Term search conjoined with a 100-mile geo filter:
/// `GET /geosearch/{term}`.
pub async fn geo_conjunction_search(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Result<String> {
    let radius_m = parse_distance(NEARBY_RADIUS)?;
    let outcome = state.engine.geo_conjunction_search(&term, ANCHOR, radius_m)?;
    tracing::info!(%term, hits = outcome.total, "conjunction geo search");
    Ok(format!("\n\nResults for: {term}\n\n{outcome}"))
}

/// Runtime counters in JSON: `GET /debug/vars`.
pub async fn debug_vars(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let vars = json!({
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "ingest": state.ingest.snapshot(),
        "index": {
            "docs": state.engine.doc_count()?,
            "segments": state.engine.segment_count(),
        },
    });
    Ok(Json(vars))
}
