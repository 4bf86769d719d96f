//! Search result model and its human-readable rendering.

use std::fmt;

/// A single search result hit.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Document identifier
    pub id: String,

    /// Relevance score
    pub score: f32,

    /// Highlighted HTML snippet, when highlighting was requested
    pub snippet: Option<String>,

    /// Score explanation (pretty JSON), when explanations were requested
    pub explanation: Option<String>,
}

/// One bucket of a facet aggregation.
#[derive(Debug, Clone)]
pub struct FacetBucket {
    pub term: String,
    pub count: u64,
}

/// The outcome of one search request.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// The query as the caller phrased it
    pub query: String,

    /// Total matches before the page-size cut
    pub total: usize,

    /// The returned page of hits
    pub hits: Vec<SearchHit>,

    /// `styles` facet buckets (term search only)
    pub facets: Vec<FacetBucket>,

    /// Search execution time in milliseconds
    pub took_ms: f64,
}

impl fmt::Display for SearchOutcome {
    /// Plain-text rendering served by the HTTP façade.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total == 0 {
            return write!(f, "0 matches, took {:.2}ms", self.took_ms);
        }
        writeln!(
            f,
            "{} matches, showing 1 through {}, took {:.2}ms",
            self.total,
            self.hits.len(),
            self.took_ms
        )?;
        for (rank, hit) in self.hits.iter().enumerate() {
            writeln!(f, "{}. {} ({:.6})", rank + 1, hit.id, hit.score)?;
            if let Some(snippet) = &hit.snippet {
                writeln!(f, "\t{snippet}")?;
            }
            if let Some(explanation) = &hit.explanation {
                writeln!(f, "\texplanation: {explanation}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_zero_matches() {
        let outcome = SearchOutcome {
            query: "nothing".into(),
            total: 0,
            hits: vec![],
            facets: vec![],
            took_ms: 0.4,
        };
        assert!(outcome.to_string().starts_with("0 matches"));
    }

    #[test]
    fn renders_ranked_hits_with_snippets() {
        let outcome = SearchOutcome {
            query: "ale".into(),
            total: 2,
            hits: vec![
                SearchHit {
                    id: "a".into(),
                    score: 0.58,
                    snippet: Some("an <b>ale</b>".into()),
                    explanation: None,
                },
                SearchHit {
                    id: "b".into(),
                    score: 0.31,
                    snippet: None,
                    explanation: None,
                },
            ],
            facets: vec![],
            took_ms: 1.2,
        };
        let rendered = outcome.to_string();
        assert!(rendered.contains("2 matches, showing 1 through 2"));
        assert!(rendered.contains("1. a ("));
        assert!(rendered.contains("2. b ("));
        assert!(rendered.contains("<b>ale</b>"));
    }
}
