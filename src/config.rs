//! Index and search configuration
//!
//! Every tuning knob of the engine lives here: seek-table strides used when
//! chunks are built, and the ranking weights applied at query time. All
//! structs deserialize from JSON with per-field defaults, so a config file
//! only has to name the values it overrides.

use crate::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Index layout configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory holding `IndexChunk_#####` / `HashFile_#####` files
    pub index_dir: PathBuf,

    /// Number of chunk ids probed when opening the reader (ids `0..num_chunks`)
    pub num_chunks: u32,

    /// A posting-list seek checkpoint is emitted every N postings
    pub posting_seek_stride: usize,

    /// A document-directory seek checkpoint is emitted every N documents
    pub doc_seek_stride: usize,

    /// Build-time static rank heuristic used by `IndexChunk::add_document`
    pub static_rank: StaticRankWeights,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("chunks"),
            num_chunks: 1,
            posting_seek_stride: 64,
            doc_seek_stride: 32,
            static_rank: StaticRankWeights::default(),
        }
    }
}

impl IndexConfig {
    /// Config rooted at `dir` with default strides
    pub fn with_dir(dir: impl Into<PathBuf>, num_chunks: u32) -> Self {
        Self {
            index_dir: dir.into(),
            num_chunks,
            ..Default::default()
        }
    }

    /// Small strides so that even tiny test corpora exercise the seek tables
    pub fn for_testing() -> Self {
        Self {
            posting_seek_stride: 4,
            doc_seek_stride: 2,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.posting_seek_stride == 0 || self.doc_seek_stride == 0 {
            return Err(IndexError::Config("seek stride must be > 0".into()));
        }
        if self.num_chunks > 100_000 {
            return Err(IndexError::Config(format!(
                "num_chunks {} exceeds the 5-digit chunk file namespace",
                self.num_chunks
            )));
        }
        Ok(())
    }
}

/// Weights of the build-time static rank, in tenths of a point
///
/// `static_rank = url_length * len(url) + article_length * bucket / 10`,
/// where `bucket` is the `length_buckets` entry for the document's word
/// count (very short, short, medium, long, very long).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticRankWeights {
    pub url_length: i64,
    pub article_length: i64,
    pub length_buckets: [i64; 5],
}

impl Default for StaticRankWeights {
    fn default() -> Self {
        Self {
            url_length: 10,
            article_length: 25,
            length_buckets: [-10, 8, 10, 5, -10],
        }
    }
}

/// Weights of the span-based dynamic score
///
/// Each span count is multiplied by its weight, the sum is multiplied by the
/// section weight (title or body).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicWeights {
    pub short_span: i64,
    pub ordered_span: i64,
    pub phrase_match: i64,
    pub top_span: i64,

    pub title_section: i64,
    pub body_section: i64,

    /// Total absolute distance (summed over aligned terms) below which a span is "short"
    pub short_span_size: u64,

    /// Prefix length (in Locations from document start) that counts as "top"
    pub top_span_size: u64,
}

impl Default for DynamicWeights {
    fn default() -> Self {
        Self {
            short_span: 4,
            ordered_span: 3,
            phrase_match: 8,
            top_span: 2,
            title_section: 5,
            body_section: 1,
            short_span_size: 12,
            top_span_size: 64,
        }
    }
}

/// Weights of the URL heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlWeights {
    /// Scale applied to relative term/host-segment overlap
    pub host_overlap: i64,

    /// Scale applied to relative term/path-segment overlap
    pub path_overlap: i64,

    /// Bonus when every query term occurs in the host
    pub host_all_terms: i64,

    /// Bonus when every query term occurs in the path
    pub path_all_terms: i64,

    /// URLs strictly shorter than this get `short_url_bonus`
    pub short_url_length: usize,
    pub short_url_bonus: i64,

    /// Single-word query equal to a path segment of a wikipedia/dictionary URL
    pub reference_bonus: i64,
}

impl Default for UrlWeights {
    fn default() -> Self {
        Self {
            host_overlap: 40,
            path_overlap: 20,
            host_all_terms: 50,
            path_all_terms: 25,
            short_url_length: 40,
            short_url_bonus: 10,
            reference_bonus: 100,
        }
    }
}

/// Ranking configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    /// Capacity of the bounded result list
    pub top_n: usize,

    /// Multiplier for the per-document static rank (0 = ignore)
    pub static_rank_weight: i64,

    pub dynamic: DynamicWeights,
    pub url: UrlWeights,

    /// Evaluate chunks on the rayon pool instead of sequentially
    pub parallel_chunks: bool,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            top_n: 32,
            static_rank_weight: 0,
            dynamic: DynamicWeights::default(),
            url: UrlWeights::default(),
            parallel_chunks: true,
        }
    }
}

impl RankConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(IndexError::Config("top_n must be > 0".into()));
        }
        Ok(())
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub index: IndexConfig,
    pub rank: RankConfig,
}

impl SearchConfig {
    /// Test preset: small seek strides, sequential chunk evaluation
    pub fn for_testing() -> Self {
        Self {
            index: IndexConfig::for_testing(),
            rank: RankConfig {
                parallel_chunks: false,
                ..Default::default()
            },
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SearchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        self.index.validate()?;
        self.rank.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SearchConfig::from_json_str(
            r#"{ "index": { "num_chunks": 7 }, "rank": { "top_n": 10, "dynamic": { "phrase_match": 20 } } }"#,
        )
        .unwrap();

        assert_eq!(config.index.num_chunks, 7);
        assert_eq!(config.index.posting_seek_stride, 64);
        assert_eq!(config.rank.top_n, 10);
        assert_eq!(config.rank.dynamic.phrase_match, 20);
        assert_eq!(config.rank.dynamic.short_span, DynamicWeights::default().short_span);
    }

    #[test]
    fn test_rejects_zero_stride() {
        let err = SearchConfig::from_json_str(r#"{ "index": { "posting_seek_stride": 0 } }"#);
        assert!(matches!(err, Err(IndexError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_top_n() {
        let err = SearchConfig::from_json_str(r#"{ "rank": { "top_n": 0 } }"#);
        assert!(matches!(err, Err(IndexError::Config(_))));
    }

    #[test]
    fn test_with_dir_keeps_default_strides() {
        let config = IndexConfig::with_dir("/tmp/idx", 12);
        assert_eq!(config.index_dir, PathBuf::from("/tmp/idx"));
        assert_eq!(config.num_chunks, 12);
        assert_eq!(config.posting_seek_stride, IndexConfig::default().posting_seek_stride);
        assert_eq!(config.static_rank, StaticRankWeights::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_static_rank_weights_from_json() {
        let config = SearchConfig::from_json_str(
            r#"{ "index": { "static_rank": { "url_length": 0, "length_buckets": [0, 1, 2, 3, 4] } } }"#,
        )
        .unwrap();
        assert_eq!(config.index.static_rank.url_length, 0);
        assert_eq!(config.index.static_rank.article_length, 25);
        assert_eq!(config.index.static_rank.length_buckets, [0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.json");
        let original = SearchConfig::for_testing();
        std::fs::write(&path, serde_json::to_string(&original).unwrap()).unwrap();

        let loaded = SearchConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded, original);
    }
}
