//! Chunk serialization and atomic publication

use super::chunk::IndexChunk;
use super::{INDEX_MAGIC, INDEX_VERSION, MAX_CHUNK_ID};
use crate::storage::{build_hash_blob, push_u64, WORD};
use crate::{IndexError, Result};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub(crate) const PREAMBLE_LEN: usize = 2 * WORD;

pub fn index_file_name(chunk_id: u32) -> Result<String> {
    check_chunk_id(chunk_id)?;
    Ok(format!("IndexChunk_{:05}", chunk_id))
}

pub fn hash_file_name(chunk_id: u32) -> Result<String> {
    check_chunk_id(chunk_id)?;
    Ok(format!("HashFile_{:05}", chunk_id))
}

fn check_chunk_id(chunk_id: u32) -> Result<()> {
    if chunk_id > MAX_CHUNK_ID {
        return Err(IndexError::ChunkIdOutOfRange(chunk_id));
    }
    Ok(())
}

/// In-memory image of both chunk files
#[derive(Debug, Clone)]
pub struct SerializedChunk {
    pub index: Vec<u8>,
    pub dictionary: Vec<u8>,
}

/// Published file locations of one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPaths {
    pub chunk_id: u32,
    pub index: PathBuf,
    pub dictionary: PathBuf,
}

/// Writer for the chunk files of one index directory
#[derive(Debug, Clone)]
pub struct IndexFile {
    dir: PathBuf,
}

impl IndexFile {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lay out a finished chunk as its two file images
    ///
    /// Sizes are summed up front so the index image is allocated once.
    pub fn serialize(chunk: &IndexChunk) -> Result<SerializedChunk> {
        chunk.check_complete()?;

        let documents = chunk.documents();
        let total = PREAMBLE_LEN
            + documents.encoded_len()
            + chunk.postings().map(|(_, list)| list.encoded_len()).sum::<usize>();

        let mut index = Vec::with_capacity(total);
        push_u64(&mut index, INDEX_MAGIC);
        push_u64(&mut index, INDEX_VERSION);
        documents.write_to(&mut index);

        let mut offsets = Vec::with_capacity(chunk.term_count());
        for (term, list) in chunk.postings() {
            offsets.push((term, index.len() as u64));
            list.write_to(&mut index);
        }
        debug_assert_eq!(index.len(), total);

        let dictionary = build_hash_blob(offsets)?;
        Ok(SerializedChunk { index, dictionary })
    }

    /// Serialize and publish `chunk` as chunk `chunk_id`
    ///
    /// Both files are written to temporary names, synced, then renamed into
    /// place, index first and dictionary last.
    pub fn write(&self, chunk_id: u32, chunk: &IndexChunk) -> Result<ChunkPaths> {
        let index_name = index_file_name(chunk_id)?;
        let hash_name = hash_file_name(chunk_id)?;
        let image = Self::serialize(chunk)?;

        fs::create_dir_all(&self.dir)?;
        let index = self.publish(&index_name, &image.index)?;
        let dictionary = self.publish(&hash_name, &image.dictionary)?;

        log::info!(
            "[IndexFile] published chunk {}: {} docs, {} terms, {} + {} bytes",
            chunk_id,
            chunk.document_count(),
            chunk.term_count(),
            image.index.len(),
            image.dictionary.len()
        );

        Ok(ChunkPaths {
            chunk_id,
            index,
            dictionary,
        })
    }

    /// Publish independent chunks in parallel; chunk `i` gets id `first_id + i`
    pub fn write_all(&self, first_id: u32, chunks: &[IndexChunk]) -> Result<Vec<ChunkPaths>> {
        let last = (chunks.len() as u64).saturating_add(first_id as u64);
        if chunks.is_empty() {
            return Ok(Vec::new());
        }
        if last - 1 > MAX_CHUNK_ID as u64 {
            return Err(IndexError::ChunkIdOutOfRange(u32::try_from(last - 1).unwrap_or(u32::MAX)));
        }

        chunks
            .par_iter()
            .enumerate()
            .map(|(i, chunk)| self.write(first_id + i as u32, chunk))
            .collect()
    }

    fn publish(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let final_path = self.dir.join(name);
        let temp_path = self.dir.join(format!("{}.tmp", name));

        let result = Self::write_synced(&temp_path, bytes).and_then(|_| {
            fs::rename(&temp_path, &final_path)?;
            Ok(())
        });
        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        Ok(final_path)
    }

    fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }
}
