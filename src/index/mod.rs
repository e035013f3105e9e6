//! Index chunks: build, publish, read
//!
//! A chunk is a contiguous slice of the corpus with its own Location space.
//! It is written as two immutable files:
//!
//! - `IndexChunk_#####`: preamble, document directory, posting lists
//! - `HashFile_#####`: term dictionary (term -> posting list offset)
//!
//! Files are published with write-to-temp + rename, the dictionary last, so
//! a reader never sees a dictionary without its index file.

pub mod chunk;
pub mod file;
pub mod reader;

pub use chunk::IndexChunk;
pub use file::{hash_file_name, index_file_name, ChunkPaths, IndexFile, SerializedChunk};
pub use reader::{ChunkReader, ChunkView, IndexFileReader};

/// Word position within a chunk
pub type Location = u64;

/// Dictionary key of the document-boundary pseudo-term
pub const END_DOC_TERM: &str = "\u{1}enddoc";

/// Suffix appended to a word to form its title-section term
pub const TITLE_MARKER: char = '!';

/// Largest chunk id representable in a 5-digit file name
pub const MAX_CHUNK_ID: u32 = 99_999;

pub const INDEX_MAGIC: u64 = u64::from_ne_bytes(*b"CHUNKIDX");
pub const INDEX_VERSION: u64 = 1;

/// Title-section term for `word`
pub fn title_term(word: &str) -> String {
    let mut term = String::with_capacity(word.len() + 1);
    term.push_str(word);
    term.push(TITLE_MARKER);
    term
}
