//! The search engine adapter.
//!
//! Wraps the Tantivy index behind the three operations the HTTP façade
//! needs, plus the bootstrap (open-or-create) and batched-write paths used
//! at startup. This is the only way documents are written or queried; the
//! engine itself mediates concurrent readers and the single writer.

use crate::search::document::to_index_document;
use crate::search::error::{SearchError, SearchResult};
use crate::search::geo::{haversine_m, BoundingBox, GeoPoint};
use crate::search::response::{FacetBucket, SearchHit, SearchOutcome};
use crate::search::schema::{build_schema, BrewFields, FieldNames};
use serde_json::Value as JsonValue;
use std::ops::Bound;
use std::path::Path;
use std::time::Instant;
use tantivy::collector::{Collector, Count, FacetCollector, SegmentCollector, TopDocs};
use tantivy::columnar::Column;
use tantivy::query::{AllQuery, BooleanQuery, Occur, Query, QueryParser, RangeQuery};
use tantivy::schema::{Schema, Value};
use tantivy::snippet::SnippetGenerator;
use tantivy::{
    DocAddress, DocId, Index, IndexReader, IndexWriter, ReloadPolicy, Score, SegmentOrdinal,
    SegmentReader, TantivyDocument, Term,
};

/// Heap for the single index writer (50 MB).
const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Page size for term and conjunction searches.
const TERM_PAGE_SIZE: usize = 30;

/// Page size for the anchor-only geo search.
const GEO_PAGE_SIZE: usize = 10;

/// Facet buckets returned for the `styles` facet.
const STYLES_FACET_SIZE: usize = 3;

/// A transient write buffer of `(id, document)` pairs.
///
/// Batches are submitted atomically and never reused afterwards.
#[derive(Debug, Default)]
pub struct DocumentBatch {
    docs: Vec<(String, JsonValue)>,
}

impl DocumentBatch {
    pub fn push(&mut self, id: String, doc: JsonValue) {
        self.docs.push((id, doc));
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Process-wide handle over the on-disk index.
pub struct SearchEngine {
    index: Index,
    schema: Schema,
    fields: BrewFields,
    writer: tokio::sync::Mutex<IndexWriter>,
    reader: IndexReader,
    created: bool,
}

impl SearchEngine {
    /// Open the index at `path`, or create a fresh one when the path does
    /// not exist yet.
    ///
    /// Three outcomes:
    /// - an index is already there → open it, `was_created()` is false and
    ///   the caller must not ingest;
    /// - the path is absent (or an empty directory) → create a new index
    ///   with the corpus mapping, `was_created()` is true;
    /// - the path holds something that is not an index → error, which the
    ///   supervisor treats as fatal.
    pub fn open_or_create(path: &Path) -> SearchResult<Self> {
        let meta = path.join("meta.json");
        let (index, created) = if meta.exists() {
            tracing::info!(path = %path.display(), "opening existing index");
            let index = Index::open_in_dir(path)
                .map_err(|e| SearchError::OpenFailed(e.to_string()))?;
            (index, false)
        } else if path.exists() && std::fs::read_dir(path)?.next().is_some() {
            return Err(SearchError::InvalidIndexPath(format!(
                "{} exists but holds no index",
                path.display()
            )));
        } else {
            tracing::info!(path = %path.display(), "creating new index");
            std::fs::create_dir_all(path)?;
            let index = Index::create_in_dir(path, build_schema())
                .map_err(|e| SearchError::CreateFailed(e.to_string()))?;
            (index, true)
        };

        let schema = index.schema();
        let fields = BrewFields::from_schema(&schema)?;

        let writer = index
            .writer(WRITER_HEAP_BYTES)
            .map_err(|e| SearchError::OpenFailed(format!("failed to create writer: {e}")))?;

        // Manual reloads: submit_batch refreshes the reader after each
        // commit, so a search issued after a submission sees the batch.
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e: tantivy::TantivyError| SearchError::OpenFailed(e.to_string()))?;

        Ok(Self {
            index,
            schema,
            fields,
            writer: tokio::sync::Mutex::new(writer),
            reader,
            created,
        })
    }

    /// Whether this handle created a fresh index (and ingestion should run).
    pub fn was_created(&self) -> bool {
        self.created
    }

    pub fn new_batch(&self) -> DocumentBatch {
        DocumentBatch::default()
    }

    /// Submit a batch: add every document, commit, and refresh the reader.
    ///
    /// Identifier collisions are last-writer-wins: each add is preceded by a
    /// delete of the same id. Returns the number of documents submitted.
    pub async fn submit_batch(&self, batch: DocumentBatch) -> SearchResult<usize> {
        let submitted = batch.docs.len();
        let mut writer = self.writer.lock().await;
        for (id, value) in &batch.docs {
            let doc = to_index_document(&self.schema, id, value)?;
            writer.delete_term(Term::from_field_text(self.fields.id, id));
            writer
                .add_document(doc)
                .map_err(|e| SearchError::IndexingFailed(format!("document {id}: {e}")))?;
        }
        writer
            .commit()
            .map_err(|e| SearchError::IndexingFailed(format!("commit failed: {e}")))?;
        drop(writer);
        self.reader.reload()?;
        Ok(submitted)
    }

    /// Free-text search in the engine's query-string grammar.
    ///
    /// Page size 30, HTML snippet highlighting, and a `styles` facet over
    /// the `state` field (top 3 buckets).
    pub fn term_search(&self, term: &str) -> SearchResult<SearchOutcome> {
        let started = Instant::now();
        let query = self.parse_query(term)?;
        let searcher = self.reader.searcher();

        let (total, top_docs) =
            searcher.search(&*query, &(Count, TopDocs::with_limit(TERM_PAGE_SIZE)))?;

        let snippets = self.snippet_generator(&searcher, &*query);
        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            hits.push(SearchHit {
                id: self.doc_id(&doc),
                score,
                snippet: snippets.as_ref().and_then(|g| render_snippet(g, &doc)),
                explanation: None,
            });
        }

        let mut facet_collector = FacetCollector::for_field(FieldNames::STATE);
        facet_collector.add_facet("/state");
        let facet_counts = searcher.search(&*query, &facet_collector)?;
        let facets = facet_counts
            .top_k("/state", STYLES_FACET_SIZE)
            .into_iter()
            .map(|(facet, count)| FacetBucket {
                term: facet_leaf(&facet.to_string()),
                count,
            })
            .collect();

        Ok(SearchOutcome {
            query: term.to_string(),
            total,
            hits,
            facets,
            took_ms: started.elapsed().as_secs_f64() * 1_000.0,
        })
    }

    /// Geo-distance search: every document whose `geo` point lies within
    /// `radius_m` of `anchor`, with per-hit score explanations.
    pub fn geo_search(&self, anchor: GeoPoint, radius_m: f64) -> SearchResult<SearchOutcome> {
        let query = self.geo_box_query(anchor, radius_m);
        let label = format!(
            "geo within {:.0}m of ({:.6}, {:.6})",
            radius_m, anchor.lon, anchor.lat
        );
        self.geo_execute(&*query, anchor, radius_m, GEO_PAGE_SIZE, false, true, label)
    }

    /// Conjunction of a query-string query and a geo-distance filter.
    ///
    /// Page size 30 with HTML snippet highlighting, like the term search.
    pub fn geo_conjunction_search(
        &self,
        term: &str,
        anchor: GeoPoint,
        radius_m: f64,
    ) -> SearchResult<SearchOutcome> {
        let term_query = self.parse_query(term)?;
        let geo_query = self.geo_box_query(anchor, radius_m);
        let conjunction = BooleanQuery::new(vec![
            (Occur::Must, term_query),
            (Occur::Must, geo_query),
        ]);
        self.geo_execute(
            &conjunction,
            anchor,
            radius_m,
            TERM_PAGE_SIZE,
            true,
            false,
            term.to_string(),
        )
    }

    /// Number of documents currently searchable.
    pub fn doc_count(&self) -> SearchResult<u64> {
        let searcher = self.reader.searcher();
        let count = searcher.search(&AllQuery, &Count)?;
        Ok(count as u64)
    }

    /// Number of segments in the current snapshot.
    pub fn segment_count(&self) -> usize {
        self.reader.searcher().segment_readers().len()
    }

    fn parse_query(&self, term: &str) -> SearchResult<Box<dyn Query>> {
        let parser = QueryParser::for_index(&self.index, vec![self.fields.text]);
        Ok(parser.parse_query(term)?)
    }

    /// Bounding-box candidate query for a distance filter. When the radius
    /// covers the globe (or the box would wrap) every document is a
    /// candidate and the exact distance check does all the work.
    fn geo_box_query(&self, anchor: GeoPoint, radius_m: f64) -> Box<dyn Query> {
        match BoundingBox::around(anchor, radius_m) {
            Some(bb) => {
                let lat_range = RangeQuery::new_f64_bounds(
                    FieldNames::LAT.to_string(),
                    Bound::Included(bb.min_lat),
                    Bound::Included(bb.max_lat),
                );
                let lon_range = RangeQuery::new_f64_bounds(
                    FieldNames::LON.to_string(),
                    Bound::Included(bb.min_lon),
                    Bound::Included(bb.max_lon),
                );
                Box::new(BooleanQuery::new(vec![
                    (Occur::Must, Box::new(lat_range) as Box<dyn Query>),
                    (Occur::Must, Box::new(lon_range) as Box<dyn Query>),
                ]))
            }
            None => Box::new(AllQuery),
        }
    }

    /// Run a geo-filtered search: every document matching `query` whose
    /// point lies within `radius_m` of `anchor` counts toward the total,
    /// and the top `page_size` by score are returned as hits.
    #[allow(clippy::too_many_arguments)]
    fn geo_execute(
        &self,
        query: &dyn Query,
        anchor: GeoPoint,
        radius_m: f64,
        page_size: usize,
        highlight: bool,
        explain: bool,
        label: String,
    ) -> SearchResult<SearchOutcome> {
        let started = Instant::now();
        let searcher = self.reader.searcher();
        let collector = GeoCollector {
            anchor,
            radius_m,
            limit: page_size,
        };
        let (total, top_docs) = searcher.search(query, &collector)?;

        let snippets = if highlight {
            self.snippet_generator(&searcher, query)
        } else {
            None
        };

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            let explanation = if explain {
                match query.explain(&searcher, address) {
                    Ok(explanation) => Some(explanation.to_pretty_json()),
                    Err(e) => {
                        tracing::debug!(error = %e, "score explanation unavailable");
                        None
                    }
                }
            } else {
                None
            };
            hits.push(SearchHit {
                id: self.doc_id(&doc),
                score,
                snippet: snippets.as_ref().and_then(|g| render_snippet(g, &doc)),
                explanation,
            });
        }

        Ok(SearchOutcome {
            query: label,
            total,
            hits,
            facets: Vec::new(),
            took_ms: started.elapsed().as_secs_f64() * 1_000.0,
        })
    }

    fn snippet_generator(
        &self,
        searcher: &tantivy::Searcher,
        query: &dyn Query,
    ) -> Option<SnippetGenerator> {
        match SnippetGenerator::create(searcher, query, self.fields.text) {
            Ok(generator) => Some(generator),
            Err(e) => {
                tracing::debug!(error = %e, "snippet generator unavailable, highlights absent");
                None
            }
        }
    }

    fn doc_id(&self, doc: &TantivyDocument) -> String {
        doc.get_first(self.fields.id)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

/// Distance-filtering collector.
///
/// Visits every matching document, reads its point from the `lat`/`lon`
/// fast-field columns, counts the ones within the radius, and keeps the
/// top `limit` by score. Documents without a point never match.
struct GeoCollector {
    anchor: GeoPoint,
    radius_m: f64,
    limit: usize,
}

impl Collector for GeoCollector {
    type Fruit = (usize, Vec<(Score, DocAddress)>);
    type Child = GeoSegmentCollector;

    fn for_segment(
        &self,
        segment_local_id: SegmentOrdinal,
        segment: &SegmentReader,
    ) -> tantivy::Result<GeoSegmentCollector> {
        Ok(GeoSegmentCollector {
            anchor: self.anchor,
            radius_m: self.radius_m,
            limit: self.limit,
            segment_ord: segment_local_id,
            lat: segment.fast_fields().f64(FieldNames::LAT)?,
            lon: segment.fast_fields().f64(FieldNames::LON)?,
            total: 0,
            hits: Vec::new(),
        })
    }

    fn requires_scoring(&self) -> bool {
        true
    }

    fn merge_fruits(
        &self,
        segment_fruits: Vec<(usize, Vec<(Score, DocAddress)>)>,
    ) -> tantivy::Result<Self::Fruit> {
        let mut total = 0;
        let mut hits = Vec::new();
        for (segment_total, segment_hits) in segment_fruits {
            total += segment_total;
            hits.extend(segment_hits);
        }
        hits.sort_by(|a, b| b.0.total_cmp(&a.0));
        hits.truncate(self.limit);
        Ok((total, hits))
    }
}

struct GeoSegmentCollector {
    anchor: GeoPoint,
    radius_m: f64,
    limit: usize,
    segment_ord: SegmentOrdinal,
    lat: Column<f64>,
    lon: Column<f64>,
    total: usize,
    hits: Vec<(Score, DocAddress)>,
}

impl SegmentCollector for GeoSegmentCollector {
    type Fruit = (usize, Vec<(Score, DocAddress)>);

    fn collect(&mut self, doc: DocId, score: Score) {
        let (Some(lat), Some(lon)) = (self.lat.first(doc), self.lon.first(doc)) else {
            return;
        };
        if haversine_m(self.anchor, GeoPoint::new(lon, lat)) > self.radius_m {
            return;
        }
        self.total += 1;
        self.hits.push((score, DocAddress::new(self.segment_ord, doc)));
        // Keep the per-segment buffer near the page size.
        if self.hits.len() >= self.limit * 2 + 64 {
            self.hits.sort_by(|a, b| b.0.total_cmp(&a.0));
            self.hits.truncate(self.limit);
        }
    }

    fn harvest(self) -> Self::Fruit {
        (self.total, self.hits)
    }
}

fn render_snippet(generator: &SnippetGenerator, doc: &TantivyDocument) -> Option<String> {
    let snippet = generator.snippet_from_doc(doc);
    if snippet.fragment().is_empty() {
        None
    } else {
        Some(snippet.to_html())
    }
}

/// Last path component of a facet, e.g. `/state/CA` → `CA`.
fn facet_leaf(path: &str) -> String {
    path.rsplit('/').next().unwrap_or_default().to_string()
}
