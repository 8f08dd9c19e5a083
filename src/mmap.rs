//! Memory-mapped file backing for every on-disk artifact this crate produces.
//!
//! Two thin wrappers: a read-only mapping over an existing file (`ReadMapping`), and a writable
//! mapping that creates (or truncates) the file to the requested size before mapping it
//! (`WriteMapping`). Neither has a typed element view baked in: every format in this crate reads
//! its own typed header off the front of the mapping and works in terms of raw bytes from there.

use std::fs::{File, OpenOptions};
use std::path::Path;

use mmap_rs::{Mmap, MmapFlags, MmapMut, MmapOptions};

use crate::error::{DiskDexError, Result};

fn mmap_err(context: &str, err: impl std::fmt::Display) -> DiskDexError {
    DiskDexError::Mmap(format!("{context}: {err}"))
}

/// A read-only mapping over an existing file, opened `MAP_PRIVATE` so no writes, even through
/// unsafe code elsewhere in the process, can reach the backing file.
pub struct ReadMapping {
    mmap: Mmap,
}

impl ReadMapping {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let len = file.metadata()?.len() as usize;

        let mmap = unsafe {
            MmapOptions::new(len)
                .map_err(|e| mmap_err(&format!("sizing mapping for {}", path.display()), e))?
                .with_flags(MmapFlags::empty())
                .with_file(file, 0)
                .map()
                .map_err(|e| mmap_err(&format!("mapping {}", path.display()), e))?
        };

        Ok(Self { mmap })
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.mmap.as_slice()
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.len() == 0
    }
}

/// A writable mapping over a file this crate is building.
///
/// The file is created (or truncated) to exactly `len` bytes before being mapped `MAP_SHARED`,
/// so writes through the mapping are visible to anything that re-opens the file once the
/// mapping is flushed (dropped, or explicitly via [`WriteMapping::flush`]).
pub struct WriteMapping {
    mmap: MmapMut,
}

impl WriteMapping {
    pub fn create(path: impl AsRef<Path>, len: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(len as u64)?;

        let mmap = unsafe {
            MmapOptions::new(len)
                .map_err(|e| mmap_err(&format!("sizing mapping for {}", path.display()), e))?
                .with_flags(MmapFlags::SHARED)
                .with_file(file, 0)
                .map_mut()
                .map_err(|e| mmap_err(&format!("mapping {}", path.display()), e))?
        };

        Ok(Self { mmap })
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.mmap.as_slice()
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.mmap.as_mut_slice()
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.len() == 0
    }

    /// Flushes dirty pages to the backing file. Dropping the mapping without calling this still
    /// persists the data (the OS writes dirty shared pages back on unmap), but callers that need
    /// to know the bytes are durable before proceeding (e.g. before memory-mapping the same file
    /// read-only in another process) should call this explicitly.
    pub fn flush(&self) -> Result<()> {
        self.mmap
            .flush(0..self.mmap.len())
            .map_err(|e| mmap_err("flushing mapping", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");

        {
            let mut w = WriteMapping::create(&path, 16).unwrap();
            w.as_bytes_mut().copy_from_slice(&[7u8; 16]);
            w.flush().unwrap();
        }

        let r = ReadMapping::open(&path).unwrap();
        assert_eq!(r.as_bytes(), &[7u8; 16]);
    }

    #[test]
    fn create_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");

        {
            let mut w = WriteMapping::create(&path, 32).unwrap();
            w.as_bytes_mut().fill(0xFF);
        }

        let w = WriteMapping::create(&path, 8).unwrap();
        assert_eq!(w.len(), 8);
    }
}
