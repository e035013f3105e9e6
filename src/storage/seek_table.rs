//! Seek tables: sparse `(byte_offset, key)` checkpoints
//!
//! Entries are fixed width (two native u64) so any entry can be read in
//! O(1) and the table can be galloped directly in the mapped bytes. Keys
//! are strictly increasing, and so are byte offsets.
//!
//! The key is a Location for posting lists and a document index for the
//! document directory; the owner decides what a key means.

use super::{push_u64, read_u64, WORD};
use crate::{IndexError, Result};

/// Size of one serialized entry
pub const SEEK_ENTRY_SIZE: usize = 2 * WORD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekEntry {
    /// Offset into the owner's data region where decoding can resume
    pub byte_offset: u64,
    /// Key in effect at `byte_offset`
    pub key: u64,
}

impl SeekEntry {
    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        push_u64(out, self.byte_offset);
        push_u64(out, self.key);
    }
}

/// Borrowed view over serialized entries
#[derive(Debug, Clone, Copy)]
pub struct SeekTableView<'a> {
    bytes: &'a [u8],
}

impl<'a> SeekTableView<'a> {
    /// Wrap exactly `count` entries; `bytes` must be `count * SEEK_ENTRY_SIZE` long
    pub fn new(bytes: &'a [u8], count: usize) -> Result<Self> {
        let expected = count
            .checked_mul(SEEK_ENTRY_SIZE)
            .ok_or_else(|| IndexError::corrupt("seek table size overflow"))?;
        if bytes.len() != expected {
            return Err(IndexError::corrupt(format!(
                "seek table of {} entries needs {} bytes, got {}",
                count,
                expected,
                bytes.len()
            )));
        }
        Ok(Self { bytes })
    }

    pub fn empty() -> Self {
        Self { bytes: &[] }
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / SEEK_ENTRY_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn entry(&self, index: usize) -> Result<SeekEntry> {
        let base = index
            .checked_mul(SEEK_ENTRY_SIZE)
            .ok_or_else(|| IndexError::corrupt("seek entry index overflow"))?;
        Ok(SeekEntry {
            byte_offset: read_u64(self.bytes, base)?,
            key: read_u64(self.bytes, base + WORD)?,
        })
    }

    fn key(&self, index: usize) -> Result<u64> {
        read_u64(self.bytes, index * SEEK_ENTRY_SIZE + WORD)
    }

    /// Index of the last entry whose key is `<= key`, searching from `from`
    ///
    /// Gallops forward from `from` (doubling the step) until it brackets the
    /// answer, then binary-searches inside the bracket. Returns `None` when
    /// `from` is out of range or its key already exceeds `key`.
    pub fn last_at_or_before(&self, key: u64, from: usize) -> Result<Option<usize>> {
        let n = self.len();
        if from >= n || self.key(from)? > key {
            return Ok(None);
        }

        // Invariant: key(lo) <= key, and key(hi) > key or hi == n
        let mut lo = from;
        let mut step = 1usize;
        let mut hi = loop {
            let probe = lo.saturating_add(step);
            if probe >= n {
                break n;
            }
            if self.key(probe)? > key {
                break probe;
            }
            lo = probe;
            step = step.saturating_mul(2);
        };

        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if self.key(mid)? <= key {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        Ok(Some(lo))
    }
}
