//! Read-only byte sources for published chunk files
//!
//! A `MappedFile` is either a real read-only memory map or an owned buffer.
//! Everything above this layer only ever sees `&[u8]`, so the same decoding
//! code runs against mmapped chunk files in production and plain vectors in
//! tests. The mapping is released when the `MappedFile` is dropped.

use crate::Result;
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::ops::Deref;
use std::path::{Path, PathBuf};

enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

/// Immutable bytes of one chunk file
pub struct MappedFile {
    path: Option<PathBuf>,
    backing: Backing,
}

impl MappedFile {
    /// Map `path` read-only
    ///
    /// Returns `Ok(None)` for a zero-length file: such a file cannot be
    /// mapped and carries no chunk data.
    pub fn open(path: &Path) -> Result<Option<Self>> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(None);
        }

        // Published chunk files are write-once; nothing mutates them while mapped.
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        Ok(Some(Self {
            path: Some(path.to_path_buf()),
            backing: Backing::Mapped(mmap),
        }))
    }

    /// Wrap an in-memory buffer
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            path: None,
            backing: Backing::Owned(bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.backing {
            Backing::Mapped(mmap) => &mmap[..],
            Backing::Owned(bytes) => &bytes[..],
        }
    }

    /// Source path, `None` for in-memory buffers
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self.backing, Backing::Mapped(_))
    }
}

impl Deref for MappedFile {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl std::fmt::Debug for MappedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedFile")
            .field("path", &self.path)
            .field("len", &self.as_bytes().len())
            .field("mapped", &self.is_mapped())
            .finish()
    }
}
