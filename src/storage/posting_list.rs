//! Delta-encoded posting lists with seek tables
//!
//! Layout (all header fields native u64):
//!
//! ```text
//! posting_count | document_count | last_location | seek_stride
//! seek_entry_count | data_len
//! seek_entry_count x (byte_offset, base_location)
//! data_len bytes of varint deltas
//! ```
//!
//! `posting_count` is the term's index frequency and `document_count` the
//! number of distinct documents it occurs in. The first delta is relative
//! to Location 0. Seek entry `j` is written just
//! before posting `(j + 1) * seek_stride` is appended: it records where that
//! posting's delta starts and the Location of the posting before it, which
//! is exactly the state needed to resume decoding there.

use super::seek_table::{SeekEntry, SeekTableView, SEEK_ENTRY_SIZE};
use super::varint::{decode_varint, encode_varint_into};
use super::{checked_end, push_u64, read_u64, to_usize, WORD};
use crate::{IndexError, Result};

const HEADER_LEN: usize = 6 * WORD;

/// Position of one posting inside a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekResult {
    /// Location of the posting
    pub location: u64,
    /// Ordinal of the posting within its list
    pub index: u64,
    /// Offset of the posting's delta within the data region
    pub byte_offset: usize,
    /// Location of the preceding posting, `None` for the first one
    pub previous: Option<u64>,
    /// Offset just past the posting's delta
    pub(crate) next_offset: usize,
}

/// Build-time accumulator for one term
#[derive(Debug, Clone)]
pub struct PostingListBuilder {
    stride: usize,
    data: Vec<u8>,
    seek: Vec<SeekEntry>,
    count: u64,
    last: Option<u64>,
    documents: u64,
    last_document: Option<u64>,
}

impl PostingListBuilder {
    pub fn new(stride: usize) -> Self {
        Self {
            stride: stride.max(1),
            data: Vec::new(),
            seek: Vec::new(),
            count: 0,
            last: None,
            documents: 0,
            last_document: None,
        }
    }

    /// Append a Location falling in document `document`
    ///
    /// Locations must be strictly increasing and documents non-decreasing.
    pub fn add_post(&mut self, location: u64, document: u64) -> Result<()> {
        if let Some(last_document) = self.last_document {
            if document < last_document {
                return Err(IndexError::InvalidArgument(format!(
                    "posting in document {} after document {}",
                    document, last_document
                )));
            }
        }
        let delta = match self.last {
            Some(last) if location <= last => {
                return Err(IndexError::InvalidArgument(format!(
                    "posting {} not after previous posting {}",
                    location, last
                )));
            }
            Some(last) => location - last,
            None => location,
        };

        if let Some(last) = self.last {
            if self.count % self.stride as u64 == 0 {
                self.seek.push(SeekEntry {
                    byte_offset: self.data.len() as u64,
                    key: last,
                });
            }
        }

        encode_varint_into(delta, &mut self.data);
        self.count += 1;
        self.last = Some(location);
        if self.last_document != Some(document) {
            self.documents += 1;
            self.last_document = Some(document);
        }
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.count
    }

    /// Distinct documents seen so far
    pub fn document_frequency(&self) -> u64 {
        self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn last_location(&self) -> Option<u64> {
        self.last
    }

    /// Exact serialized size
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.seek.len() * SEEK_ENTRY_SIZE + self.data.len()
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.reserve(self.encoded_len());
        push_u64(out, self.count);
        push_u64(out, self.documents);
        push_u64(out, self.last.unwrap_or(0));
        push_u64(out, self.stride as u64);
        push_u64(out, self.seek.len() as u64);
        push_u64(out, self.data.len() as u64);
        for entry in &self.seek {
            entry.write_to(out);
        }
        out.extend_from_slice(&self.data);
    }
}

/// Zero-copy view of a serialized posting list
#[derive(Debug, Clone, Copy)]
pub struct PostingListView<'a> {
    count: u64,
    documents: u64,
    last_location: u64,
    stride: u64,
    seek: SeekTableView<'a>,
    data: &'a [u8],
}

impl<'a> PostingListView<'a> {
    /// Parse the list starting at `offset` in `bytes`
    ///
    /// Every length is validated against `bytes` before any slice is taken.
    pub fn parse(bytes: &'a [u8], offset: usize) -> Result<Self> {
        checked_end(offset, HEADER_LEN, bytes.len(), "posting list header")?;
        let count = read_u64(bytes, offset)?;
        let documents = read_u64(bytes, offset + WORD)?;
        let last_location = read_u64(bytes, offset + 2 * WORD)?;
        let stride = read_u64(bytes, offset + 3 * WORD)?;
        let seek_count = to_usize(read_u64(bytes, offset + 4 * WORD)?, "seek entry count")?;
        let data_len = to_usize(read_u64(bytes, offset + 5 * WORD)?, "posting data length")?;

        let seek_start = offset + HEADER_LEN;
        let seek_len = seek_count
            .checked_mul(SEEK_ENTRY_SIZE)
            .ok_or_else(|| IndexError::corrupt("seek table size overflow"))?;
        let data_start = checked_end(seek_start, seek_len, bytes.len(), "posting seek table")?;
        let data_end = checked_end(data_start, data_len, bytes.len(), "posting data")?;

        if stride == 0 {
            return Err(IndexError::corrupt("posting list seek stride is 0"));
        }
        // Every posting takes at least one byte
        if count > data_len as u64 {
            return Err(IndexError::corrupt(format!(
                "{} postings cannot fit in {} bytes",
                count, data_len
            )));
        }
        if documents > count || (count > 0 && documents == 0) {
            return Err(IndexError::corrupt(format!(
                "{} documents for {} postings",
                documents, count
            )));
        }
        if seek_count as u64 > count / stride {
            return Err(IndexError::corrupt(format!(
                "{} seek entries for {} postings at stride {}",
                seek_count, count, stride
            )));
        }

        Ok(Self {
            count,
            documents,
            last_location,
            stride,
            seek: SeekTableView::new(&bytes[seek_start..data_start], seek_count)?,
            data: &bytes[data_start..data_end],
        })
    }

    /// Number of postings (index frequency of the term)
    pub fn len(&self) -> u64 {
        self.count
    }

    /// Number of distinct documents containing the term
    pub fn document_frequency(&self) -> u64 {
        self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn last_location(&self) -> Option<u64> {
        (self.count > 0).then_some(self.last_location)
    }

    /// First posting with Location >= `target`
    pub fn find(&self, target: u64) -> Result<Option<SeekResult>> {
        self.find_after(target, None)
    }

    /// First posting with Location >= `target`, resuming from `from`
    ///
    /// `from` must be a result previously returned by this list. Decoding
    /// restarts from whichever is further ahead: `from` or the seek-table
    /// checkpoint for `target`.
    pub fn find_after(&self, target: u64, from: Option<&SeekResult>) -> Result<Option<SeekResult>> {
        if self.count == 0 || target > self.last_location {
            return Ok(None);
        }

        let mut offset = 0usize;
        let mut previous = None;
        let mut index = 0u64;

        if let Some(from) = from {
            if from.location >= target {
                return Ok(Some(*from));
            }
            offset = from.next_offset;
            previous = Some(from.location);
            index = from.index + 1;
        }

        // Entry j checkpoints posting (j + 1) * stride; skip entries behind `index`
        if let Some(key) = target.checked_sub(1) {
            let hint = to_usize((index / self.stride).saturating_sub(1), "seek hint")?;
            if let Some(j) = self.seek.last_at_or_before(key, hint)? {
                let checkpoint = (j as u64 + 1) * self.stride;
                if checkpoint > index {
                    let entry = self.seek.entry(j)?;
                    let byte_offset = to_usize(entry.byte_offset, "seek entry offset")?;
                    if byte_offset >= self.data.len() {
                        return Err(IndexError::corrupt(format!(
                            "seek entry offset {} outside {}-byte posting data",
                            byte_offset,
                            self.data.len()
                        )));
                    }
                    offset = byte_offset;
                    previous = Some(entry.key);
                    index = checkpoint;
                }
            }
        }

        self.scan(target, offset, previous, index)
    }

    fn scan(
        &self,
        target: u64,
        mut offset: usize,
        mut previous: Option<u64>,
        mut index: u64,
    ) -> Result<Option<SeekResult>> {
        while index < self.count {
            let rest = self.data.get(offset..).unwrap_or(&[]);
            let (delta, used) = decode_varint(rest)?;

            let location = match previous {
                Some(_) if delta == 0 => {
                    return Err(IndexError::corrupt(format!("zero delta at posting {}", index)));
                }
                Some(prev) => prev
                    .checked_add(delta)
                    .ok_or_else(|| IndexError::corrupt("posting location overflow"))?,
                None => delta,
            };

            if location >= target {
                return Ok(Some(SeekResult {
                    location,
                    index,
                    byte_offset: offset,
                    previous,
                    next_offset: offset + used,
                }));
            }

            previous = Some(location);
            offset += used;
            index += 1;
        }
        Ok(None)
    }

    /// Decode every Location in order
    pub fn locations(&self) -> Result<Vec<u64>> {
        let mut out = Vec::with_capacity(self.count as usize);
        let mut cursor = self.find(0)?;
        while let Some(hit) = cursor {
            out.push(hit.location);
            cursor = match hit.location.checked_add(1) {
                Some(next) => self.find_after(next, Some(&hit))?,
                None => None,
            };
        }
        Ok(out)
    }
}
