//! Error types for search operations

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur in the search engine adapter
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Opening an existing index failed
    #[error("failed to open index: {0}")]
    OpenFailed(String),

    /// Creating a new index failed
    #[error("failed to create index: {0}")]
    CreateFailed(String),

    /// The index path exists but does not hold a usable index
    #[error("index path is not a valid index: {0}")]
    InvalidIndexPath(String),

    /// Schema mismatch between the on-disk index and this build
    #[error("schema error: {0}")]
    Schema(String),

    /// Query parsing failed
    #[error("query parsing failed: {0}")]
    QueryParse(String),

    /// Search execution failed
    #[error("search execution failed: {0}")]
    SearchFailed(String),

    /// Document indexing failed
    #[error("document indexing failed: {0}")]
    IndexingFailed(String),

    /// Invalid geo distance string (e.g. "100mi", "5km")
    #[error("invalid distance: {0}")]
    InvalidDistance(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tantivy::TantivyError> for SearchError {
    fn from(err: tantivy::TantivyError) -> Self {
        SearchError::SearchFailed(err.to_string())
    }
}

impl From<tantivy::query::QueryParserError> for SearchError {
    fn from(err: tantivy::query::QueryParserError) -> Self {
        SearchError::QueryParse(err.to_string())
    }
}
