//! URL heuristic
//!
//! Rewards query terms that appear in the host or path of a document URL.
//! Overlap is relative: a term covering most of a segment scores more than
//! the same term buried in a long segment. Relative overlap is computed in
//! fixed point through a reciprocal table instead of per-URL division.

use crate::config::UrlWeights;
use url::Url;

/// Fixed-point scale of the reciprocal table
const SCALE: i64 = 1 << 10;

/// Segments longer than this share the last table entry
const MAX_SEGMENT_LEN: usize = 64;

static RECIPROCALS: [i64; MAX_SEGMENT_LEN + 1] = reciprocals();

const fn reciprocals() -> [i64; MAX_SEGMENT_LEN + 1] {
    let mut table = [0i64; MAX_SEGMENT_LEN + 1];
    let mut n = 1;
    while n <= MAX_SEGMENT_LEN {
        table[n] = SCALE / n as i64;
        n += 1;
    }
    table
}

/// `term_len / segment_len` scaled by `SCALE`
fn relative_overlap(term_len: usize, segment_len: usize) -> i64 {
    i64::try_from(term_len)
        .unwrap_or(i64::MAX)
        .saturating_mul(RECIPROCALS[segment_len.min(MAX_SEGMENT_LEN)])
}

/// Lowercased host and path of `url`
///
/// Falls back to a plain split for strings `url` cannot parse.
fn host_and_path(url: &str) -> (String, String) {
    match Url::parse(url) {
        Ok(parsed) => (
            parsed.host_str().unwrap_or("").to_ascii_lowercase(),
            parsed.path().to_ascii_lowercase(),
        ),
        Err(_) => {
            let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
            let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
            (host.to_ascii_lowercase(), format!("/{}", path.to_ascii_lowercase()))
        }
    }
}

fn host_segments(host: &str) -> impl Iterator<Item = &str> {
    host.split(['.', '-']).filter(|s| !s.is_empty())
}

fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '-', '_', '.', '?', '=', '&', '+'])
        .filter(|s| !s.is_empty())
}

/// Best relative overlap of `term` with any segment containing it
fn best_overlap<'s>(term: &str, segments: impl Iterator<Item = &'s str>) -> Option<i64> {
    segments
        .filter(|segment| segment.contains(term))
        .map(|segment| relative_overlap(term.len(), segment.len()))
        .max()
}

fn is_reference_site(host: &str) -> bool {
    host.contains("wikipedia") || host.contains("dictionary")
}

pub fn url_score(url: &str, terms: &[&str], weights: &UrlWeights) -> i64 {
    let mut score = 0i64;
    if url.len() < weights.short_url_length {
        score = score.saturating_add(weights.short_url_bonus);
    }
    if terms.is_empty() {
        return score;
    }

    let (host, path) = host_and_path(url);
    let mut all_in_host = true;
    let mut all_in_path = true;

    for term in terms {
        let term = term.to_lowercase();
        if term.is_empty() {
            continue;
        }

        match best_overlap(&term, host_segments(&host)) {
            Some(overlap) => score = score.saturating_add(weights.host_overlap.saturating_mul(overlap) / SCALE),
            None => all_in_host = false,
        }
        match best_overlap(&term, path_segments(&path)) {
            Some(overlap) => score = score.saturating_add(weights.path_overlap.saturating_mul(overlap) / SCALE),
            None => all_in_path = false,
        }
    }

    if all_in_host {
        score = score.saturating_add(weights.host_all_terms);
    }
    if all_in_path {
        score = score.saturating_add(weights.path_all_terms);
    }

    if let [single] = terms {
        let single = single.to_lowercase();
        if is_reference_site(&host) && path.split('/').any(|segment| segment == single) {
            score = score.saturating_add(weights.reference_bonus);
        }
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> UrlWeights {
        UrlWeights::default()
    }

    #[test]
    fn test_reciprocal_table() {
        assert_eq!(RECIPROCALS[0], 0);
        assert_eq!(RECIPROCALS[1], SCALE);
        assert_eq!(RECIPROCALS[4], SCALE / 4);
        assert_eq!(relative_overlap(4, 4), SCALE);
        assert_eq!(relative_overlap(2, 500), 2 * (SCALE / 64));
    }

    #[test]
    fn test_host_and_path_split() {
        assert_eq!(
            host_and_path("https://Docs.Rust-Lang.org/Book/ch01.html"),
            ("docs.rust-lang.org".to_string(), "/book/ch01.html".to_string())
        );
        assert_eq!(
            host_and_path("not a url/with path"),
            ("not a url".to_string(), "/with path".to_string())
        );
    }

    #[test]
    fn test_tighter_overlap_scores_higher() {
        let w = weights();
        let tight = url_score("http://rust.org/", &["rust"], &w);
        let loose = url_score("http://rustaceansareeverywhere.org/", &["rust"], &w);
        assert!(tight > loose, "{} vs {}", tight, loose);
    }

    #[test]
    fn test_all_terms_bonuses() {
        let w = UrlWeights {
            short_url_bonus: 0,
            ..weights()
        };
        let both = url_score("http://rust.example.com/learn/rust", &["rust"], &w);
        let host_only = url_score("http://rust.example.com/learn/go", &["rust"], &w);
        let neither = url_score("http://example.com/learn/go", &["rust"], &w);

        assert_eq!(neither, 0);
        assert!(host_only >= w.host_all_terms);
        assert!(both >= host_only + w.path_all_terms);

        // One missing term voids the all-terms bonus
        let partial = url_score("http://rust.example.com/", &["rust", "go"], &w);
        assert!(partial < w.host_all_terms);
    }

    #[test]
    fn test_short_url_bonus() {
        let w = weights();
        assert_eq!(url_score("http://a.io/", &[], &w), w.short_url_bonus);
        assert_eq!(url_score(&format!("http://a.io/{}", "x".repeat(60)), &[], &w), 0);
    }

    #[test]
    fn test_extreme_weights_saturate() {
        let w = UrlWeights {
            host_overlap: i64::MAX,
            host_all_terms: i64::MAX,
            ..weights()
        };
        assert_eq!(url_score("http://rust.org/", &["rust"], &w), i64::MAX);
    }

    #[test]
    fn test_reference_bonus_single_word_only() {
        let w = weights();
        let url = "https://en.wikipedia.org/wiki/octopus";
        let single = url_score(url, &["octopus"], &w);
        let other = url_score("https://en.example.org/wiki/octopus", &["octopus"], &w);
        assert!(single - other >= w.reference_bonus);

        let partial_segment = url_score("https://en.wikipedia.org/wiki/octopuses", &["octopus"], &w);
        assert!(single - partial_segment >= w.reference_bonus);

        let two_words = url_score(url, &["octopus", "wiki"], &w);
        let two_words_elsewhere = url_score("https://en.example.org/wiki/octopus", &["octopus", "wiki"], &w);
        assert!(two_words - two_words_elsewhere < w.reference_bonus);
    }
}
