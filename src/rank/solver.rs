//! Constraint solver: evaluate a query over every chunk and rank the matches

use super::dynamic::dynamic_score;
use super::top_n::{RankedHit, TopN};
use super::url_score::url_score;
use crate::config::RankConfig;
use crate::index::{ChunkReader, IndexFileReader};
use crate::isr::Isr;
use crate::query::Constraint;
use crate::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Best hits, highest score first
    pub hits: Vec<RankedHit>,
    /// Documents that satisfied the query across all chunks
    pub total_matches: u64,
}

struct ChunkResults {
    top: TopN,
    matches: u64,
}

pub struct Searcher<'r> {
    reader: &'r IndexFileReader,
    config: RankConfig,
}

impl<'r> Searcher<'r> {
    pub fn new(reader: &'r IndexFileReader, config: RankConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { reader, config })
    }

    pub fn config(&self) -> &RankConfig {
        &self.config
    }

    /// Rank every document matching `query`
    ///
    /// A chunk that fails mid-query is logged and contributes nothing.
    pub fn search(&self, query: &Constraint) -> Result<SearchResults> {
        if query.is_empty() {
            return Ok(SearchResults::default());
        }

        let started = Instant::now();
        let terms = query.literal_words();
        let chunks = self.reader.chunks();

        let per_chunk: Vec<Option<ChunkResults>> = if self.config.parallel_chunks {
            chunks
                .par_iter()
                .map(|chunk| self.search_chunk_logged(chunk, query, &terms))
                .collect()
        } else {
            chunks
                .iter()
                .map(|chunk| self.search_chunk_logged(chunk, query, &terms))
                .collect()
        };

        let mut top = TopN::new(self.config.top_n);
        let mut total_matches = 0;
        for result in per_chunk.into_iter().flatten() {
            total_matches += result.matches;
            top.merge(result.top);
        }

        log::debug!(
            "[Searcher] {} terms, {} chunks, {} matches, {} hits in {:?}",
            terms.len(),
            chunks.len(),
            total_matches,
            top.len(),
            started.elapsed()
        );

        Ok(SearchResults {
            hits: top.into_vec(),
            total_matches,
        })
    }

    fn search_chunk_logged(&self, chunk: &ChunkReader, query: &Constraint, terms: &[&str]) -> Option<ChunkResults> {
        match self.search_chunk(chunk, query, terms) {
            Ok(results) => Some(results),
            Err(e) => {
                log::warn!("[Searcher] skipping chunk {}: {}", chunk.id(), e);
                None
            }
        }
    }

    fn search_chunk(&self, chunk: &ChunkReader, query: &Constraint, terms: &[&str]) -> Result<ChunkResults> {
        let view = chunk.view()?;
        let compiled = query.compile(&view)?;
        let mut root = compiled.isr;
        let mut groups = compiled.term_groups;
        let mut end_doc = Isr::end_doc(&view)?;

        let mut top = TopN::new(self.config.top_n);
        let mut matches = 0;

        let mut next = root.seek(0);
        while let Some(hit) = next {
            matches += 1;

            // Directory lookups follow the independent EndDoc cursor
            let window = end_doc.seek(hit.location).map_or(hit.window, |end| end.window);
            match view.find_doc(window.index)? {
                Some(doc) => {
                    let static_rank = i64::try_from(doc.static_rank).unwrap_or(i64::MAX);
                    let score = dynamic_score(&mut groups, window, &self.config.dynamic)
                        .saturating_add(url_score(doc.url, terms, &self.config.url))
                        .saturating_add(self.config.static_rank_weight.saturating_mul(static_rank));
                    if top.accepts(score) {
                        top.insert(RankedHit {
                            url: doc.url.to_string(),
                            score,
                        });
                    }
                }
                None => log::warn!(
                    "[Searcher] chunk {}: match in document {} missing from directory",
                    chunk.id(),
                    window.index
                ),
            }

            next = root.next_document();
        }

        Ok(ChunkResults { top, matches })
    }
}
