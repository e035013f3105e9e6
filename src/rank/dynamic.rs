//! Span-based dynamic score
//!
//! For every occurrence of the anchor term (the rarest query word present in
//! the document) each other word is aligned to its nearest occurrence on
//! either side. The resulting span is classified:
//!
//! - short: summed distance from the anchor below `short_span_size`
//! - top: every aligned word within `top_span_size` of the document start
//! - ordered: a multi-word group appears in query order
//! - phrase: an ordered group with every gap exactly 1
//!
//! Body and title sections are scored separately, then weighted.

use crate::config::DynamicWeights;
use crate::index::Location;
use crate::isr::DocWindow;
use crate::query::TermGroup;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanCounts {
    pub short: i64,
    pub ordered: i64,
    pub phrase: i64,
    pub top: i64,
}

impl SpanCounts {
    /// Weighted sum; saturates since weights come from configuration
    pub fn weighted(&self, weights: &DynamicWeights) -> i64 {
        self.short
            .saturating_mul(weights.short_span)
            .saturating_add(self.ordered.saturating_mul(weights.ordered_span))
            .saturating_add(self.phrase.saturating_mul(weights.phrase_match))
            .saturating_add(self.top.saturating_mul(weights.top_span))
    }
}

/// One ranked word's occurrences inside a document
#[derive(Debug, Clone, Default)]
pub struct TermOccurrences {
    /// Postings in the whole chunk
    pub frequency: u64,
    pub positions: Vec<Location>,
}

/// Occurrence nearest to `anchor`; ties go to the later one
fn nearest(positions: &[Location], anchor: Location) -> Option<Location> {
    let after = positions.partition_point(|&p| p < anchor);
    let later = positions.get(after).copied();
    let earlier = after.checked_sub(1).map(|i| positions[i]);
    match (earlier, later) {
        (Some(e), Some(l)) if anchor - e < l - anchor => Some(e),
        (_, Some(l)) => Some(l),
        (e, None) => e,
    }
}

pub fn count_spans(groups: &[Vec<TermOccurrences>], window_start: Location, weights: &DynamicWeights) -> SpanCounts {
    let mut counts = SpanCounts::default();

    let anchor = groups
        .iter()
        .enumerate()
        .flat_map(|(g, terms)| terms.iter().enumerate().map(move |(t, occ)| ((g, t), occ)))
        .filter(|(_, occ)| !occ.positions.is_empty())
        .min_by_key(|(_, occ)| occ.frequency);
    let Some((anchor_id, anchor_occ)) = anchor else {
        return counts;
    };

    let top_limit = window_start.saturating_add(weights.top_span_size);
    let mut aligned: Vec<Vec<Option<Location>>> = groups.iter().map(|terms| vec![None; terms.len()]).collect();

    for &at in &anchor_occ.positions {
        let mut span = 0u64;
        let mut near_top = true;

        for (g, terms) in groups.iter().enumerate() {
            for (t, occ) in terms.iter().enumerate() {
                let location = if (g, t) == anchor_id {
                    Some(at)
                } else {
                    nearest(&occ.positions, at)
                };
                aligned[g][t] = location;

                if let Some(location) = location {
                    span = span.saturating_add(location.abs_diff(at));
                    if location > top_limit {
                        near_top = false;
                    }
                }
            }
        }

        if span < weights.short_span_size {
            counts.short += 1;
        }
        if near_top {
            counts.top += 1;
        }

        for group in aligned.iter().filter(|group| group.len() > 1) {
            let Some(locations) = group.iter().copied().collect::<Option<Vec<_>>>() else {
                continue;
            };
            if locations.windows(2).all(|pair| pair[0] < pair[1]) {
                counts.ordered += 1;
                if locations.windows(2).all(|pair| pair[1] - pair[0] == 1) {
                    counts.phrase += 1;
                }
            }
        }
    }

    counts
}

/// Body and title occurrences of every group member inside `window`
///
/// A title word is posted under both its body and title terms, so title
/// Locations are removed from the body section.
fn load(groups: &mut [TermGroup<'_>], window: DocWindow) -> (Vec<Vec<TermOccurrences>>, Vec<Vec<TermOccurrences>>) {
    let mut body = Vec::with_capacity(groups.len());
    let mut title = Vec::with_capacity(groups.len());

    for group in groups.iter_mut() {
        let mut body_terms = Vec::with_capacity(group.terms.len());
        let mut title_terms = Vec::with_capacity(group.terms.len());
        for term in group.terms.iter_mut() {
            let in_title = term.title.collect_range(window.start, window.end);
            let in_body = term
                .body
                .collect_range(window.start, window.end)
                .into_iter()
                .filter(|location| in_title.binary_search(location).is_err())
                .collect();

            body_terms.push(TermOccurrences {
                frequency: term.body.len(),
                positions: in_body,
            });
            title_terms.push(TermOccurrences {
                frequency: term.title.len(),
                positions: in_title,
            });
        }
        body.push(body_terms);
        title.push(title_terms);
    }
    (body, title)
}

/// Weighted body + title score of one matched document
///
/// Body spans cover body words only; title words score in the title
/// section alone.
///
/// Documents must be presented in increasing order: the ranking cursors
/// only move forward.
pub fn dynamic_score(groups: &mut [TermGroup<'_>], window: DocWindow, weights: &DynamicWeights) -> i64 {
    if groups.is_empty() || window.is_empty() {
        return 0;
    }
    let (body, title) = load(groups, window);
    let body = count_spans(&body, window.start, weights).weighted(weights);
    let title = count_spans(&title, window.start, weights).weighted(weights);
    weights
        .body_section
        .saturating_mul(body)
        .saturating_add(weights.title_section.saturating_mul(title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{ChunkReader, IndexChunk, IndexFile};
    use crate::query::Constraint;

    fn occ(frequency: u64, positions: &[Location]) -> TermOccurrences {
        TermOccurrences {
            frequency,
            positions: positions.to_vec(),
        }
    }

    #[test]
    fn test_nearest() {
        assert_eq!(nearest(&[], 5), None);
        assert_eq!(nearest(&[1, 9], 5), Some(9));
        assert_eq!(nearest(&[4, 9], 5), Some(4));
        assert_eq!(nearest(&[1, 2], 5), Some(2));
        assert_eq!(nearest(&[7, 8], 5), Some(7));
        assert_eq!(nearest(&[5], 5), Some(5));
    }

    #[test]
    fn test_anchor_is_rarest_present_term() {
        let weights = DynamicWeights::default();
        // B is rarest: spans are built around 6 and 40
        let groups = vec![vec![occ(10, &[5]), occ(2, &[6, 40])]];
        let counts = count_spans(&groups, 0, &weights);
        assert_eq!(
            counts,
            SpanCounts {
                short: 1,
                ordered: 2,
                phrase: 1,
                top: 2
            }
        );
    }

    #[test]
    fn test_absent_terms_ignored() {
        let weights = DynamicWeights::default();
        let groups = vec![vec![occ(1, &[]), occ(3, &[2])], vec![occ(5, &[])]];
        let counts = count_spans(&groups, 0, &weights);
        // Lone anchor occurrence: zero span, near the top, no complete group
        assert_eq!(
            counts,
            SpanCounts {
                short: 1,
                ordered: 0,
                phrase: 0,
                top: 1
            }
        );

        let nothing = vec![vec![occ(1, &[]), occ(1, &[])]];
        assert_eq!(count_spans(&nothing, 0, &weights), SpanCounts::default());
    }

    #[test]
    fn test_out_of_order_and_far_from_top() {
        let weights = DynamicWeights::default();
        let start = 1_000;
        let groups = vec![vec![occ(1, &[start + 100]), occ(9, &[start + 99])]];
        let counts = count_spans(&groups, start, &weights);
        assert_eq!(counts.ordered, 0);
        assert_eq!(counts.phrase, 0);
        assert_eq!(counts.top, 0);
        assert_eq!(counts.short, 1);
    }

    #[test]
    fn test_weighted_saturates() {
        let weights = DynamicWeights {
            short_span: i64::MAX,
            top_span: i64::MAX,
            ..Default::default()
        };
        let counts = SpanCounts {
            short: 3,
            ordered: 0,
            phrase: 0,
            top: 2,
        };
        assert_eq!(counts.weighted(&weights), i64::MAX);
    }

    fn chunk_view_groups(title: &[&str], body: &[&str], word: &str, check: impl FnOnce(&mut [TermGroup<'_>])) {
        let mut chunk = IndexChunk::with_strides(2, 2);
        chunk.add_document("http://example.com/", title, body).unwrap();
        let reader = ChunkReader::from_serialized(0, IndexFile::serialize(&chunk).unwrap()).unwrap();
        let view = reader.view().unwrap();
        let mut compiled = Constraint::word(word).compile(&view).unwrap();
        check(&mut compiled.term_groups);
    }

    #[test]
    fn test_title_word_scores_only_in_title_section() {
        let weights = DynamicWeights::default();
        // One title occurrence at Location 0: short + top span, no ordered group
        let one_span = weights.short_span + weights.top_span;

        chunk_view_groups(&["otters"], &[], "otters", |groups| {
            let window = DocWindow {
                index: 0,
                start: 0,
                end: 1,
            };
            assert_eq!(dynamic_score(groups, window, &weights), weights.title_section * one_span);
        });

        chunk_view_groups(&[], &["otters"], "otters", |groups| {
            let window = DocWindow {
                index: 0,
                start: 0,
                end: 1,
            };
            assert_eq!(dynamic_score(groups, window, &weights), weights.body_section * one_span);
        });
    }

    #[test]
    fn test_weighted() {
        let weights = DynamicWeights::default();
        let counts = SpanCounts {
            short: 1,
            ordered: 2,
            phrase: 3,
            top: 4,
        };
        assert_eq!(
            counts.weighted(&weights),
            weights.short_span + 2 * weights.ordered_span + 3 * weights.phrase_match + 4 * weights.top_span
        );
    }
}
