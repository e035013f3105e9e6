//! Storage layer: on-disk encodings of a chunk
//!
//! - `varint`: LEB128 compression primitive
//! - `mapped`: read-only byte source (mmap or owned buffer)
//! - `seek_table`: fixed-width checkpoints with galloping search
//! - `posting_list`: delta-encoded Location lists
//! - `term_dictionary`: relocatable hash blob (term -> posting list offset)
//! - `doc_directory`: document index -> (URL, static rank)
//!
//! Fixed-width fields are host-native u64. They are always read through
//! `read_u64`, which bound-checks before copying, so no decoded length or
//! offset is trusted before it has been validated against its buffer.

pub mod varint;
pub mod mapped;
pub mod seek_table;
pub mod posting_list;
pub mod term_dictionary;
pub mod doc_directory;

pub use varint::{decode_varint, encode_varint, encode_varint_into, varint_size};
pub use mapped::MappedFile;
pub use seek_table::{SeekEntry, SeekTableView};
pub use posting_list::{PostingListBuilder, PostingListView, SeekResult};
pub use term_dictionary::{build_hash_blob, term_hash, HashBlob};
pub use doc_directory::{Doc, DocumentDirectoryBuilder, DocumentDirectoryView};

use crate::{IndexError, Result};

/// Width of every fixed-size field
pub(crate) const WORD: usize = std::mem::size_of::<u64>();

/// Read a native-endian u64 at `offset`, failing if it would run past `bytes`
#[inline]
pub(crate) fn read_u64(bytes: &[u8], offset: usize) -> Result<u64> {
    let end = offset
        .checked_add(WORD)
        .ok_or_else(|| IndexError::corrupt("u64 offset overflow"))?;
    let word = bytes.get(offset..end).ok_or_else(|| {
        IndexError::corrupt(format!(
            "u64 at {} runs past end of {}-byte region",
            offset,
            bytes.len()
        ))
    })?;
    let mut raw = [0u8; WORD];
    raw.copy_from_slice(word);
    Ok(u64::from_ne_bytes(raw))
}

#[inline]
pub(crate) fn push_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_ne_bytes());
}

/// Convert a stored u64 into a usize offset/length
#[inline]
pub(crate) fn to_usize(value: u64, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| IndexError::corrupt(format!("{} {} does not fit usize", what, value)))
}

/// `offset + len`, checked against `bound`
#[inline]
pub(crate) fn checked_end(offset: usize, len: usize, bound: usize, what: &str) -> Result<usize> {
    match offset.checked_add(len) {
        Some(end) if end <= bound => Ok(end),
        _ => Err(IndexError::corrupt(format!(
            "{} [{}, +{}) exceeds region of {} bytes",
            what, offset, len, bound
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u64_bounds() {
        let mut buf = Vec::new();
        push_u64(&mut buf, 42);
        push_u64(&mut buf, u64::MAX);

        assert_eq!(read_u64(&buf, 0).unwrap(), 42);
        assert_eq!(read_u64(&buf, 8).unwrap(), u64::MAX);
        assert!(read_u64(&buf, 9).is_err());
        assert!(read_u64(&buf, usize::MAX).is_err());
    }

    #[test]
    fn test_checked_end() {
        assert_eq!(checked_end(4, 4, 8, "x").unwrap(), 8);
        assert!(checked_end(4, 5, 8, "x").is_err());
        assert!(checked_end(usize::MAX, 1, usize::MAX, "x").is_err());
    }
}
