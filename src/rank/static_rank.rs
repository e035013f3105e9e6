//! Build-time static rank
//!
//! A query-independent score stored with each document when its chunk is
//! built. It grows with URL length and favours medium-length articles over
//! very short or very long ones. Units are tenths of a point.

use crate::config::StaticRankWeights;

/// Article length bucket, by body word count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentLength {
    VeryShort = 0,
    Short = 1,
    Medium = 2,
    Long = 3,
    VeryLong = 4,
}

impl DocumentLength {
    pub fn classify(words: u64) -> Self {
        match words {
            0..=63 => DocumentLength::VeryShort,
            64..=255 => DocumentLength::Short,
            256..=1023 => DocumentLength::Medium,
            1024..=2047 => DocumentLength::Long,
            _ => DocumentLength::VeryLong,
        }
    }

    /// Weight of this bucket in `weights.length_buckets`
    pub fn weight(self, weights: &StaticRankWeights) -> i64 {
        weights.length_buckets[self as usize]
    }
}

/// Static rank of a document with URL `url` and `doc_len` body words
///
/// Negative totals clamp to 0.
pub fn static_rank(url: &str, doc_len: u64, weights: &StaticRankWeights) -> u64 {
    let url_len = i64::try_from(url.len()).unwrap_or(i64::MAX);
    let length = DocumentLength::classify(doc_len).weight(weights);
    let tenths = weights
        .url_length
        .saturating_mul(url_len)
        .saturating_add(weights.article_length.saturating_mul(length) / 10);
    u64::try_from(tenths).unwrap_or(0)
}
