//! Ranking
//!
//! `Searcher` drives a compiled query over every chunk. Each matched
//! document is scored as
//!
//! ```text
//! dynamic (span) score + URL score + static_rank_weight * static rank
//! ```
//!
//! and offered to a bounded `TopN`; per-chunk lists are merged at the end.
//! The static rank itself is computed when a chunk is built (`static_rank`).

pub mod dynamic;
pub mod solver;
pub mod static_rank;
pub mod top_n;
pub mod url_score;

pub use dynamic::{count_spans, dynamic_score, SpanCounts, TermOccurrences};
pub use solver::{SearchResults, Searcher};
pub use static_rank::{static_rank, DocumentLength};
pub use top_n::{RankedHit, TopN};
pub use url_score::url_score;
