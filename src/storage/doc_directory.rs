//! Document directory: document index -> (URL, static rank)
//!
//! ```text
//! doc_count | seek_stride | seek_entry_count | data_len   (u64 each)
//! seek_entry_count x (byte_offset, doc_index)
//! doc_count x (url_len varint | url bytes | static_rank varint)
//! ```
//!
//! Seek entry `j` points at the record of document `(j + 1) * seek_stride`.

use super::seek_table::{SeekEntry, SeekTableView, SEEK_ENTRY_SIZE};
use super::varint::{decode_varint, encode_varint_into};
use super::{checked_end, push_u64, read_u64, to_usize, WORD};
use crate::{IndexError, Result};

const HEADER_LEN: usize = 4 * WORD;

/// A document record, borrowed from the chunk bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Doc<'a> {
    pub index: u64,
    pub url: &'a str,
    pub static_rank: u64,
}

#[derive(Debug, Clone)]
pub struct DocumentDirectoryBuilder {
    stride: usize,
    data: Vec<u8>,
    seek: Vec<SeekEntry>,
    count: u64,
}

impl DocumentDirectoryBuilder {
    pub fn new(stride: usize) -> Self {
        Self {
            stride: stride.max(1),
            data: Vec::new(),
            seek: Vec::new(),
            count: 0,
        }
    }

    /// Append a document, returning its index
    pub fn add(&mut self, url: &str, static_rank: u64) -> u64 {
        let index = self.count;
        if index > 0 && index % self.stride as u64 == 0 {
            self.seek.push(SeekEntry {
                byte_offset: self.data.len() as u64,
                key: index,
            });
        }
        encode_varint_into(url.len() as u64, &mut self.data);
        self.data.extend_from_slice(url.as_bytes());
        encode_varint_into(static_rank, &mut self.data);
        self.count += 1;
        index
    }

    pub fn len(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.seek.len() * SEEK_ENTRY_SIZE + self.data.len()
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.reserve(self.encoded_len());
        push_u64(out, self.count);
        push_u64(out, self.stride as u64);
        push_u64(out, self.seek.len() as u64);
        push_u64(out, self.data.len() as u64);
        for entry in &self.seek {
            entry.write_to(out);
        }
        out.extend_from_slice(&self.data);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DocumentDirectoryView<'a> {
    count: u64,
    seek: SeekTableView<'a>,
    data: &'a [u8],
    /// Bytes consumed from the parse offset
    encoded_len: usize,
}

impl<'a> DocumentDirectoryView<'a> {
    pub fn parse(bytes: &'a [u8], offset: usize) -> Result<Self> {
        checked_end(offset, HEADER_LEN, bytes.len(), "document directory header")?;
        let count = read_u64(bytes, offset)?;
        let stride = read_u64(bytes, offset + WORD)?;
        let seek_count = to_usize(read_u64(bytes, offset + 2 * WORD)?, "seek entry count")?;
        let data_len = to_usize(read_u64(bytes, offset + 3 * WORD)?, "document data length")?;

        let seek_start = offset + HEADER_LEN;
        let seek_len = seek_count
            .checked_mul(SEEK_ENTRY_SIZE)
            .ok_or_else(|| IndexError::corrupt("seek table size overflow"))?;
        let data_start = checked_end(seek_start, seek_len, bytes.len(), "document seek table")?;
        let data_end = checked_end(data_start, data_len, bytes.len(), "document records")?;

        // Each record takes at least two bytes
        if stride == 0 || count.saturating_mul(2) > data_len as u64 {
            return Err(IndexError::corrupt(format!(
                "{} documents at stride {} in {} bytes",
                count, stride, data_len
            )));
        }

        Ok(Self {
            count,
            seek: SeekTableView::new(&bytes[seek_start..data_start], seek_count)?,
            data: &bytes[data_start..data_end],
            encoded_len: data_end - offset,
        })
    }

    pub fn len(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub(crate) fn encoded_len(&self) -> usize {
        self.encoded_len
    }

    /// Record of document `index`, `None` past the last document
    pub fn find(&self, index: u64) -> Result<Option<Doc<'a>>> {
        if index >= self.count {
            return Ok(None);
        }

        let (mut offset, mut current) = match self.seek.last_at_or_before(index, 0)? {
            Some(j) => {
                let entry = self.seek.entry(j)?;
                (to_usize(entry.byte_offset, "seek entry offset")?, entry.key)
            }
            None => (0, 0),
        };
        if current > index {
            return Err(IndexError::corrupt(format!("seek entry for doc {} past doc {}", current, index)));
        }

        loop {
            let (doc, next) = self.record_at(offset, current)?;
            if current == index {
                return Ok(Some(doc));
            }
            offset = next;
            current += 1;
        }
    }

    fn record_at(&self, offset: usize, index: u64) -> Result<(Doc<'a>, usize)> {
        let rest = self.data.get(offset..).ok_or_else(|| {
            IndexError::corrupt(format!("record offset {} outside {}-byte directory", offset, self.data.len()))
        })?;
        let (url_len, used) = decode_varint(rest)?;
        let url_start = offset + used;
        let url_end = checked_end(url_start, to_usize(url_len, "url length")?, self.data.len(), "url")?;
        let url = std::str::from_utf8(&self.data[url_start..url_end])
            .map_err(|e| IndexError::corrupt(format!("url of doc {} is not UTF-8: {}", index, e)))?;
        let (static_rank, used) = decode_varint(&self.data[url_end..])?;

        Ok((
            Doc {
                index,
                url,
                static_rank,
            },
            url_end + used,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(urls: &[&str], stride: usize) -> Vec<u8> {
        let mut builder = DocumentDirectoryBuilder::new(stride);
        for (i, url) in urls.iter().enumerate() {
            assert_eq!(builder.add(url, i as u64 * 100), i as u64);
        }
        let mut out = Vec::new();
        builder.write_to(&mut out);
        assert_eq!(out.len(), builder.encoded_len());
        out
    }

    #[test]
    fn test_find_every_document() {
        let urls: Vec<String> = (0..50).map(|i| format!("http://example.com/page/{}", i)).collect();
        let refs: Vec<&str> = urls.iter().map(String::as_str).collect();

        for stride in [1, 2, 7, 100] {
            let bytes = build(&refs, stride);
            let view = DocumentDirectoryView::parse(&bytes, 0).unwrap();
            assert_eq!(view.len(), 50);
            assert_eq!(view.encoded_len(), bytes.len());

            for (i, url) in refs.iter().enumerate() {
                let doc = view.find(i as u64).unwrap().unwrap();
                assert_eq!(doc.index, i as u64);
                assert_eq!(doc.url, *url);
                assert_eq!(doc.static_rank, i as u64 * 100);
            }
            assert!(view.find(50).unwrap().is_none());
        }
    }

    #[test]
    fn test_empty_url_allowed() {
        let bytes = build(&["", "http://b"], 1);
        let view = DocumentDirectoryView::parse(&bytes, 0).unwrap();
        assert_eq!(view.find(0).unwrap().unwrap().url, "");
        assert_eq!(view.find(1).unwrap().unwrap().url, "http://b");
    }

    #[test]
    fn test_truncated_directory() {
        let bytes = build(&["http://a", "http://b", "http://c"], 2);
        assert!(DocumentDirectoryView::parse(&bytes[..bytes.len() - 1], 0).is_err());
        assert!(DocumentDirectoryView::parse(&bytes[..HEADER_LEN], 0).is_err());
    }

    #[test]
    fn test_corrupt_url_length() {
        let mut bytes = build(&["http://a"], 4);
        // First record's url_len varint sits right after the header (no seek entries)
        bytes[HEADER_LEN] = 0x7F;
        let view = DocumentDirectoryView::parse(&bytes, 0).unwrap();
        assert!(view.find(0).is_err());
    }
}
