use clap::Parser;
use std::path::PathBuf;

/// Command-line configuration for the search service.
///
/// Every flag is optional; the defaults give a zero-config first run that
/// creates `beer-search.tantivy/` and ingests `data/`.
#[derive(Debug, Clone, Parser)]
#[command(name = "brew-search")]
#[command(about = "Full-text and geo search over a beer/brewery JSON corpus", long_about = None)]
pub struct Config {
    /// Documents per ingest batch submission
    #[arg(long, default_value_t = 100)]
    pub batch_size: usize,

    /// Directory of JSON documents to ingest into a freshly created index
    #[arg(long, default_value = "data/")]
    pub json_dir: PathBuf,

    /// Index directory (opened if it exists, created and populated otherwise)
    #[arg(long, default_value = "beer-search.tantivy")]
    pub index: PathBuf,

    /// Address the HTTP listener binds to
    #[arg(long, default_value = "127.0.0.1:3000")]
    pub bind: String,

    /// Write a CPU flamegraph covering the ingestion phase to this file
    #[arg(long)]
    pub cpuprofile: Option<PathBuf>,

    /// Write allocator heap statistics to this file when ingestion completes
    #[arg(long)]
    pub memprofile: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_table() {
        let config = Config::parse_from(["brew-search"]);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.json_dir, PathBuf::from("data/"));
        assert_eq!(config.index, PathBuf::from("beer-search.tantivy"));
        assert_eq!(config.bind, "127.0.0.1:3000");
        assert!(config.cpuprofile.is_none());
        assert!(config.memprofile.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::parse_from([
            "brew-search",
            "--batch-size",
            "2",
            "--json-dir",
            "corpus/",
            "--index",
            "idx",
            "--memprofile",
            "heap.json",
        ]);
        assert_eq!(config.batch_size, 2);
        assert_eq!(config.json_dir, PathBuf::from("corpus/"));
        assert_eq!(config.index, PathBuf::from("idx"));
        assert_eq!(config.memprofile, Some(PathBuf::from("heap.json")));
    }
}
