//! Term dictionary: a relocatable, self-contained hash blob
//!
//! ```text
//! magic | version | blob_size | bucket_count          (u64 each)
//! bucket_count x bucket_offset                       (u64, from blob start)
//! per bucket: tuple* then an 8-byte zero sentinel
//! tuple: total_len | posting_offset | hash | key bytes | NUL | pad to 8
//! ```
//!
//! All offsets are relative to the start of the blob, so the blob can be
//! mapped at any address and queried in place. The builder sizes the blob
//! exactly in a first pass and fills it in a second.

use super::{checked_end, read_u64, to_usize, WORD};
use crate::{IndexError, Result};

pub const HASH_BLOB_MAGIC: u64 = u64::from_ne_bytes(*b"HASHBLOB");
pub const HASH_BLOB_VERSION: u64 = 1;

const HEADER_LEN: usize = 4 * WORD;
const TUPLE_FIXED: usize = 3 * WORD;
const SENTINEL_LEN: usize = WORD;

/// FNV-1a 64 over the key bytes
#[inline]
pub fn term_hash(key: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    key.iter().fold(OFFSET_BASIS, |hash, &byte| (hash ^ byte as u64).wrapping_mul(PRIME))
}

#[inline]
fn tuple_len(key: &[u8]) -> usize {
    (TUPLE_FIXED + key.len() + 1).next_multiple_of(WORD)
}

struct Slot<'k> {
    key: &'k str,
    hash: u64,
    value: u64,
}

/// Build a blob mapping each term to its posting-list offset
///
/// Duplicate keys are rejected, as are keys containing NUL.
pub fn build_hash_blob<'k, I>(entries: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (&'k str, u64)>,
{
    let slots: Vec<Slot<'k>> = entries
        .into_iter()
        .map(|(key, value)| {
            if key.as_bytes().contains(&0) {
                return Err(IndexError::InvalidArgument(format!("term {:?} contains NUL", key)));
            }
            Ok(Slot {
                key,
                hash: term_hash(key.as_bytes()),
                value,
            })
        })
        .collect::<Result<_>>()?;

    let bucket_count = slots.len().max(1).next_power_of_two();
    let mask = bucket_count as u64 - 1;

    let mut buckets: Vec<Vec<&Slot<'k>>> = (0..bucket_count).map(|_| Vec::new()).collect();
    for slot in &slots {
        buckets[(slot.hash & mask) as usize].push(slot);
    }

    // Pass 1: exact size
    let table_end = HEADER_LEN + bucket_count * WORD;
    let blob_size = table_end
        + buckets
            .iter()
            .map(|chain| chain.iter().map(|s| tuple_len(s.key.as_bytes())).sum::<usize>() + SENTINEL_LEN)
            .sum::<usize>();

    // Pass 2: fill
    let mut blob = vec![0u8; blob_size];
    put_u64(&mut blob, 0, HASH_BLOB_MAGIC);
    put_u64(&mut blob, WORD, HASH_BLOB_VERSION);
    put_u64(&mut blob, 2 * WORD, blob_size as u64);
    put_u64(&mut blob, 3 * WORD, bucket_count as u64);

    let mut cursor = table_end;
    for (bucket, chain) in buckets.iter().enumerate() {
        put_u64(&mut blob, HEADER_LEN + bucket * WORD, cursor as u64);

        for (i, slot) in chain.iter().enumerate() {
            if chain[..i].iter().any(|other| other.key == slot.key) {
                return Err(IndexError::InvalidArgument(format!("duplicate term {:?}", slot.key)));
            }
            let key = slot.key.as_bytes();
            let len = tuple_len(key);
            put_u64(&mut blob, cursor, len as u64);
            put_u64(&mut blob, cursor + WORD, slot.value);
            put_u64(&mut blob, cursor + 2 * WORD, slot.hash);
            let key_start = cursor + TUPLE_FIXED;
            blob[key_start..key_start + key.len()].copy_from_slice(key);
            // NUL terminator and padding are already zero
            cursor += len;
        }

        // Zero sentinel
        cursor += SENTINEL_LEN;
    }
    debug_assert_eq!(cursor, blob_size);

    Ok(blob)
}

fn put_u64(blob: &mut [u8], offset: usize, value: u64) {
    blob[offset..offset + WORD].copy_from_slice(&value.to_ne_bytes());
}

/// Zero-copy view over a serialized blob
#[derive(Debug, Clone, Copy)]
pub struct HashBlob<'a> {
    bytes: &'a [u8],
    bucket_count: usize,
}

impl<'a> HashBlob<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(IndexError::corrupt(format!("hash blob of {} bytes has no header", bytes.len())));
        }
        if read_u64(bytes, 0)? != HASH_BLOB_MAGIC {
            return Err(IndexError::corrupt("bad hash blob magic"));
        }
        let version = read_u64(bytes, WORD)?;
        if version != HASH_BLOB_VERSION {
            return Err(IndexError::InvalidData(format!("unsupported hash blob version {}", version)));
        }

        let blob_size = to_usize(read_u64(bytes, 2 * WORD)?, "blob size")?;
        if blob_size > bytes.len() {
            return Err(IndexError::corrupt(format!(
                "blob size {} exceeds {} available bytes",
                blob_size,
                bytes.len()
            )));
        }
        let bucket_count = to_usize(read_u64(bytes, 3 * WORD)?, "bucket count")?;
        if bucket_count == 0 || !bucket_count.is_power_of_two() {
            return Err(IndexError::corrupt(format!("invalid bucket count {}", bucket_count)));
        }
        let table_len = bucket_count
            .checked_mul(WORD)
            .ok_or_else(|| IndexError::corrupt("bucket table size overflow"))?;
        checked_end(HEADER_LEN, table_len, blob_size, "bucket table")?;

        Ok(Self {
            bytes: &bytes[..blob_size],
            bucket_count,
        })
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    pub fn blob_size(&self) -> usize {
        self.bytes.len()
    }

    /// Posting-list offset recorded for `term`
    pub fn find(&self, term: &str) -> Result<Option<u64>> {
        let key = term.as_bytes();
        let hash = term_hash(key);
        let bucket = (hash & (self.bucket_count as u64 - 1)) as usize;
        let table_end = HEADER_LEN + self.bucket_count * WORD;

        let mut cursor = to_usize(read_u64(self.bytes, HEADER_LEN + bucket * WORD)?, "bucket offset")?;
        if cursor < table_end {
            return Err(IndexError::corrupt(format!("bucket {} offset {} inside header", bucket, cursor)));
        }

        loop {
            let len = to_usize(read_u64(self.bytes, cursor)?, "tuple length")?;
            if len == 0 {
                return Ok(None);
            }
            if len < TUPLE_FIXED + 1 || len % WORD != 0 {
                return Err(IndexError::corrupt(format!("tuple length {} at {}", len, cursor)));
            }
            let end = checked_end(cursor, len, self.bytes.len(), "hash tuple")?;

            if read_u64(self.bytes, cursor + 2 * WORD)? == hash {
                let stored = &self.bytes[cursor + TUPLE_FIXED..end];
                let stored = match stored.iter().position(|&b| b == 0) {
                    Some(nul) => &stored[..nul],
                    None => return Err(IndexError::corrupt(format!("unterminated key at {}", cursor))),
                };
                if stored == key {
                    return Ok(Some(read_u64(self.bytes, cursor + WORD)?));
                }
            }

            cursor = end;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_known_values() {
        assert_eq!(term_hash(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(term_hash(b"a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(term_hash(b"foobar"), 0x8594_4171_f739_67e8);
    }

    #[test]
    fn test_build_and_find() {
        let words: Vec<String> = (0..1000).map(|i| format!("term{}", i)).collect();
        let blob = build_hash_blob(words.iter().enumerate().map(|(i, w)| (w.as_str(), i as u64 * 3))).unwrap();
        let view = HashBlob::parse(&blob).unwrap();

        assert_eq!(view.bucket_count(), 1024);
        assert_eq!(view.blob_size(), blob.len());
        for (i, w) in words.iter().enumerate() {
            assert_eq!(view.find(w).unwrap(), Some(i as u64 * 3));
        }
        assert_eq!(view.find("term1000").unwrap(), None);
        assert_eq!(view.find("").unwrap(), None);
    }

    #[test]
    fn test_tuples_are_word_aligned() {
        for key in ["", "a", "abcdefg", "abcdefgh"] {
            assert_eq!(tuple_len(key.as_bytes()) % WORD, 0);
            assert!(tuple_len(key.as_bytes()) > TUPLE_FIXED + key.len());
        }
    }

    #[test]
    fn test_relocatable() {
        let blob = build_hash_blob([("alpha", 1), ("beta", 2)]).unwrap();
        let mut shifted = vec![0u8; 3];
        shifted.extend_from_slice(&blob);
        shifted.extend_from_slice(&[0xFF; 16]);

        let view = HashBlob::parse(&shifted[3..]).unwrap();
        assert_eq!(view.find("beta").unwrap(), Some(2));
        assert_eq!(view.blob_size(), blob.len());
    }

    #[test]
    fn test_empty_dictionary() {
        let blob = build_hash_blob(std::iter::empty()).unwrap();
        let view = HashBlob::parse(&blob).unwrap();
        assert_eq!(view.bucket_count(), 1);
        assert_eq!(view.find("anything").unwrap(), None);
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert!(build_hash_blob([("a\0b", 1)]).is_err());
        assert!(build_hash_blob([("dup", 1), ("dup", 2)]).is_err());
    }

    #[test]
    fn test_corrupt_headers() {
        let blob = build_hash_blob([("alpha", 1)]).unwrap();

        assert!(HashBlob::parse(&blob[..HEADER_LEN - 1]).is_err());
        assert!(HashBlob::parse(&blob[..blob.len() - 1]).is_err());

        let mut bad_magic = blob.clone();
        bad_magic[0] ^= 0xFF;
        assert!(HashBlob::parse(&bad_magic).is_err());

        let mut bad_buckets = blob.clone();
        put_u64(&mut bad_buckets, 3 * WORD, 3);
        assert!(HashBlob::parse(&bad_buckets).is_err());
    }

    #[test]
    fn test_corrupt_tuple_length_detected() {
        let blob = build_hash_blob([("alpha", 1)]).unwrap();
        let mut corrupt = blob.clone();
        let first_tuple = HEADER_LEN + WORD;
        put_u64(&mut corrupt, first_tuple, 1 << 40);
        let view = HashBlob::parse(&corrupt).unwrap();
        assert!(view.find("alpha").is_err());
    }
}
