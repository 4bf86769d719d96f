//! Index mapping for the corpus.
//!
//! Documents are arbitrary JSON, so the mapping is deliberately loose:
//! everything textual is searchable through one flattened field, the full
//! document is additionally indexed as a dynamic JSON field for path-scoped
//! terms (`attrs.name:ale`), and the handful of fields the query façade
//! relies on (`state` facet, `lat`/`lon` columns) are pulled out explicitly
//! at ingest time.

use crate::search::error::{SearchError, SearchResult};
use tantivy::schema::{Field, Schema, FAST, INDEXED, STORED, STRING, TEXT};

/// Names of all fields in the index schema.
pub struct FieldNames;

impl FieldNames {
    /// Document identifier derived from the source filename.
    pub const ID: &'static str = "id";
    /// Flattened concatenation of every string leaf in the document;
    /// default query field and snippet source.
    pub const TEXT: &'static str = "text";
    /// The full document as a dynamic JSON field.
    pub const ATTRS: &'static str = "attrs";
    /// Facet over the document's `state` value (`/state/CA`).
    pub const STATE: &'static str = "state";
    /// Latitude (WGS84), present when the document carries a `geo` point.
    pub const LAT: &'static str = "lat";
    /// Longitude (WGS84).
    pub const LON: &'static str = "lon";
}

/// Resolved field handles for document construction and queries.
#[derive(Debug, Clone, Copy)]
pub struct BrewFields {
    pub id: Field,
    pub text: Field,
    pub attrs: Field,
    pub state: Field,
    pub lat: Field,
    pub lon: Field,
}

impl BrewFields {
    /// Resolves field handles from a schema.
    ///
    /// Fails when the on-disk index was built with a different mapping,
    /// which the bootstrapper treats as fatal.
    pub fn from_schema(schema: &Schema) -> SearchResult<Self> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| SearchError::Schema(format!("index is missing the `{name}` field")))
        };
        Ok(Self {
            id: field(FieldNames::ID)?,
            text: field(FieldNames::TEXT)?,
            attrs: field(FieldNames::ATTRS)?,
            state: field(FieldNames::STATE)?,
            lat: field(FieldNames::LAT)?,
            lon: field(FieldNames::LON)?,
        })
    }
}

/// Build the index mapping.
///
/// Created once at index creation time and persisted by the engine inside
/// the index directory; never mutated afterwards.
pub fn build_schema() -> Schema {
    let mut builder = Schema::builder();

    // ID - stored, indexed as a single term for exact deletes/upserts
    builder.add_text_field(FieldNames::ID, STRING | STORED);

    // Flattened document text - tokenized, stored for snippet generation
    builder.add_text_field(FieldNames::TEXT, TEXT | STORED);

    // Full document - dynamic JSON, enables attrs.<path>:term queries
    builder.add_json_field(FieldNames::ATTRS, TEXT | STORED);

    // State - faceted field for the `styles` facet
    builder.add_facet_field(FieldNames::STATE, INDEXED);

    // Geo point columns
    builder.add_f64_field(FieldNames::LAT, INDEXED | STORED | FAST);
    builder.add_f64_field(FieldNames::LON, INDEXED | STORED | FAST);

    builder.build()
}
