//! Conversion from raw JSON documents to index documents.
//!
//! The service enforces no schema on incoming documents. A document is
//! indexed as: its flattened string content (default search field), the full
//! JSON tree (path-scoped terms), and, when present, the `state` string as
//! a facet and the `geo` point as lat/lon columns.

use crate::search::error::{SearchError, SearchResult};
use crate::search::geo::GeoPoint;
use crate::search::schema::FieldNames;
use serde_json::{json, Map, Value};
use tantivy::schema::Schema;
use tantivy::TantivyDocument;

/// Build the index document for `(id, value)`.
pub fn to_index_document(schema: &Schema, id: &str, value: &Value) -> SearchResult<TantivyDocument> {
    let mut wrapper = Map::new();
    wrapper.insert(FieldNames::ID.to_string(), json!(id));
    wrapper.insert(FieldNames::TEXT.to_string(), json!(flatten_text(value)));
    wrapper.insert(FieldNames::ATTRS.to_string(), value.clone());
    if let Some(state) = value.get("state").and_then(Value::as_str) {
        wrapper.insert(FieldNames::STATE.to_string(), json!(format!("/state/{state}")));
    }
    if let Some(point) = extract_geo(value) {
        wrapper.insert(FieldNames::LAT.to_string(), json!(point.lat));
        wrapper.insert(FieldNames::LON.to_string(), json!(point.lon));
    }
    let wrapper = Value::Object(wrapper).to_string();
    TantivyDocument::parse_json(schema, &wrapper)
        .map_err(|e| SearchError::IndexingFailed(format!("document {id}: {e}")))
}

/// Concatenate every string leaf of the document, in tree order.
pub fn flatten_text(value: &Value) -> String {
    let mut out = String::new();
    collect_strings(value, &mut out);
    out
}

fn collect_strings(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(s);
        }
        Value::Array(items) => {
            for item in items {
                collect_strings(item, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_strings(item, out);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Pull a geo point out of the document's `geo` field.
///
/// Accepts both `{"lon": x, "lat": y}` objects and `[lon, lat]` arrays.
pub fn extract_geo(value: &Value) -> Option<GeoPoint> {
    let geo = value.get("geo")?;
    match geo {
        Value::Object(map) => {
            let lon = map.get("lon").and_then(Value::as_f64)?;
            let lat = map.get("lat").and_then(Value::as_f64)?;
            Some(GeoPoint::new(lon, lat))
        }
        Value::Array(items) if items.len() == 2 => {
            let lon = items[0].as_f64()?;
            let lat = items[1].as_f64()?;
            Some(GeoPoint::new(lon, lat))
        }
        _ => None,
    }
}
