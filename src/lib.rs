//! chunkseek: chunked full-text index and query engine
//!
//! ## Architecture
//! - Storage layer: varint-delta posting lists with seek tables, a
//!   relocatable term-dictionary hash blob, and a document directory
//! - Index layer: write-once chunk files, published atomically and read
//!   back through read-only memory maps
//! - Query layer: constraint trees compiled into Index Stream Reader (ISR)
//!   trees that walk posting lists forward only
//! - Rank layer: span-based dynamic score + URL heuristic, bounded top-N
//!   merged across chunks
//!
//! ## Example
//! ```no_run
//! use chunkseek::{Constraint, IndexChunk, IndexFile, IndexFileReader, RankConfig, Searcher};
//!
//! # fn main() -> chunkseek::Result<()> {
//! let mut chunk = IndexChunk::default();
//! chunk.add_url("http://example.com/", 0)?;
//! chunk.add_word("hello", true)?;
//! chunk.add_word("world", false)?;
//! chunk.add_end_doc()?;
//! IndexFile::new("chunks").write(0, &chunk)?;
//!
//! let reader = IndexFileReader::open("chunks".as_ref(), 1)?;
//! let searcher = Searcher::new(&reader, RankConfig::default())?;
//! let results = searcher.search(&Constraint::phrase(["hello", "world"]))?;
//! println!("{} of {} matches", results.hits.len(), results.total_matches);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod index;
pub mod isr;
pub mod query;
pub mod rank;
pub mod storage;

mod error;

pub use config::{DynamicWeights, IndexConfig, RankConfig, SearchConfig, StaticRankWeights, UrlWeights};
pub use error::{IndexError, Result};

pub use index::{ChunkReader, ChunkView, IndexChunk, IndexFile, IndexFileReader, Location, SerializedChunk};
pub use isr::{DocWindow, Isr, Match};
pub use query::{CompiledQuery, Constraint};
pub use rank::{RankedHit, SearchResults, Searcher, TopN};
pub use storage::{Doc, SeekResult};
