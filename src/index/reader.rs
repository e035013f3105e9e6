//! Read side of published chunks
//!
//! `IndexFileReader` maps every `IndexChunk_#####` / `HashFile_#####` pair
//! it can find under the index directory. Missing, empty or invalid chunks
//! are skipped with a warning; a partially published index stays queryable.
//!
//! Readers are immutable after open and can be shared across threads by
//! reference. A `ChunkView` borrows one chunk's bytes for the duration of a
//! query.

use super::file::{hash_file_name, index_file_name, SerializedChunk, PREAMBLE_LEN};
use super::{Location, END_DOC_TERM, INDEX_MAGIC, INDEX_VERSION};
use crate::config::IndexConfig;
use crate::storage::{
    read_u64, Doc, DocumentDirectoryView, HashBlob, MappedFile, PostingListView, SeekResult, WORD,
};
use crate::{IndexError, Result};
use std::path::Path;

/// One chunk's mapped files
#[derive(Debug)]
pub struct ChunkReader {
    id: u32,
    index: MappedFile,
    dictionary: MappedFile,
}

impl ChunkReader {
    /// Map chunk `id` under `dir`
    ///
    /// Returns `Ok(None)` when either file is missing or empty.
    pub fn open(dir: &Path, id: u32) -> Result<Option<Self>> {
        let index_path = dir.join(index_file_name(id)?);
        let hash_path = dir.join(hash_file_name(id)?);
        if !index_path.exists() || !hash_path.exists() {
            return Ok(None);
        }

        let (index, dictionary) = match (MappedFile::open(&index_path)?, MappedFile::open(&hash_path)?) {
            (Some(index), Some(dictionary)) => (index, dictionary),
            _ => return Ok(None),
        };
        Self::new(id, index, dictionary).map(Some)
    }

    /// Serve a chunk straight from its in-memory images
    pub fn from_serialized(id: u32, image: SerializedChunk) -> Result<Self> {
        Self::new(id, MappedFile::from_vec(image.index), MappedFile::from_vec(image.dictionary))
    }

    fn new(id: u32, index: MappedFile, dictionary: MappedFile) -> Result<Self> {
        let reader = Self { id, index, dictionary };
        // Validate headers once so later views only fail on deep corruption
        reader.view()?;
        Ok(reader)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn view(&self) -> Result<ChunkView<'_>> {
        let index = self.index.as_bytes();
        if read_u64(index, 0)? != INDEX_MAGIC {
            return Err(IndexError::corrupt(format!("chunk {}: bad index magic", self.id)));
        }
        let version = read_u64(index, WORD)?;
        if version != INDEX_VERSION {
            return Err(IndexError::InvalidData(format!(
                "chunk {}: unsupported index version {}",
                self.id, version
            )));
        }

        Ok(ChunkView {
            id: self.id,
            index,
            dictionary: HashBlob::parse(self.dictionary.as_bytes())?,
            documents: DocumentDirectoryView::parse(index, PREAMBLE_LEN)?,
        })
    }
}

/// Borrowed, parsed view of one chunk
#[derive(Debug, Clone, Copy)]
pub struct ChunkView<'a> {
    id: u32,
    index: &'a [u8],
    dictionary: HashBlob<'a>,
    documents: DocumentDirectoryView<'a>,
}

impl<'a> ChunkView<'a> {
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Posting list of `term`, `None` if the chunk never saw it
    pub fn postings(&self, term: &str) -> Result<Option<PostingListView<'a>>> {
        match self.dictionary.find(term)? {
            Some(offset) => {
                let offset = usize::try_from(offset)
                    .map_err(|_| IndexError::corrupt(format!("posting offset {} for {:?}", offset, term)))?;
                if offset < PREAMBLE_LEN + self.documents.encoded_len() {
                    return Err(IndexError::corrupt(format!(
                        "posting offset {} for {:?} overlaps the document directory",
                        offset, term
                    )));
                }
                PostingListView::parse(self.index, offset).map(Some)
            }
            None => Ok(None),
        }
    }

    pub fn end_docs(&self) -> Result<Option<PostingListView<'a>>> {
        self.postings(END_DOC_TERM)
    }

    /// First posting of `term` at or after `target`
    pub fn find(&self, term: &str, target: Location) -> Result<Option<SeekResult>> {
        match self.postings(term)? {
            Some(list) => list.find(target),
            None => Ok(None),
        }
    }

    pub fn find_doc(&self, index: u64) -> Result<Option<Doc<'a>>> {
        self.documents.find(index)
    }

    pub fn document_count(&self) -> u64 {
        self.documents.len()
    }

    /// Number of postings of `term` in this chunk
    pub fn term_frequency(&self, term: &str) -> Result<u64> {
        Ok(self.postings(term)?.map(|list| list.len()).unwrap_or(0))
    }

    /// Number of documents in this chunk containing `term`
    pub fn document_frequency(&self, term: &str) -> Result<u64> {
        Ok(self.postings(term)?.map(|list| list.document_frequency()).unwrap_or(0))
    }
}

/// All readable chunks of an index directory, ordered by id
#[derive(Debug, Default)]
pub struct IndexFileReader {
    chunks: Vec<ChunkReader>,
}

impl IndexFileReader {
    /// Probe chunk ids `0..num_chunks` under `dir`
    ///
    /// A missing directory is an index with every chunk missing: the reader
    /// comes back empty rather than failing.
    pub fn open(dir: &Path, num_chunks: u32) -> Result<Self> {
        if !dir.is_dir() {
            log::warn!(
                "[IndexFileReader] index directory {} not found, skipping all {} chunks",
                dir.display(),
                num_chunks
            );
            return Ok(Self::default());
        }

        let mut chunks = Vec::new();
        for id in 0..num_chunks {
            match ChunkReader::open(dir, id) {
                Ok(Some(chunk)) => chunks.push(chunk),
                Ok(None) => log::warn!("[IndexFileReader] skipping chunk {}: missing or empty", id),
                Err(e) => log::warn!("[IndexFileReader] skipping chunk {}: {}", id, e),
            }
        }

        log::debug!(
            "[IndexFileReader] opened {} of {} chunks from {}",
            chunks.len(),
            num_chunks,
            dir.display()
        );
        Ok(Self { chunks })
    }

    pub fn open_with_config(config: &IndexConfig) -> Result<Self> {
        config.validate()?;
        Self::open(&config.index_dir, config.num_chunks)
    }

    /// Reader over in-memory chunk images
    pub fn from_serialized(images: impl IntoIterator<Item = (u32, SerializedChunk)>) -> Result<Self> {
        let mut chunks = images
            .into_iter()
            .map(|(id, image)| {
                index_file_name(id)?;
                ChunkReader::from_serialized(id, image)
            })
            .collect::<Result<Vec<_>>>()?;
        chunks.sort_by_key(ChunkReader::id);
        if chunks.windows(2).any(|pair| pair[0].id == pair[1].id) {
            return Err(IndexError::InvalidArgument("duplicate chunk id".into()));
        }
        Ok(Self { chunks })
    }

    pub fn chunks(&self) -> &[ChunkReader] {
        &self.chunks
    }

    pub fn chunk(&self, chunk_id: u32) -> Option<&ChunkReader> {
        self.chunks
            .binary_search_by_key(&chunk_id, ChunkReader::id)
            .ok()
            .map(|i| &self.chunks[i])
    }

    /// First posting of `term` at or after `target` in chunk `chunk_id`
    pub fn find(&self, term: &str, target: Location, chunk_id: u32) -> Result<Option<SeekResult>> {
        match self.chunk(chunk_id) {
            Some(chunk) => chunk.view()?.find(term, target),
            None => Ok(None),
        }
    }

    pub fn find_doc(&self, index: u64, chunk_id: u32) -> Result<Option<Doc<'_>>> {
        match self.chunk(chunk_id) {
            Some(chunk) => chunk.view()?.find_doc(index),
            None => Ok(None),
        }
    }

    pub fn document_count(&self) -> u64 {
        self.chunks
            .iter()
            .filter_map(|chunk| chunk.view().ok())
            .map(|view| view.document_count())
            .sum()
    }
}
