//! The `*.comp` on-disk artifact: a header-prefixed, bit-packed copy of the input text.
//!
//! Layout: `[u64 count][packed symbols]`, little-endian, `count` bytes after packing rounded up
//! to whatever [`packed::packed_byte_len`] needs. One `CompressedDnaFile` is built once and
//! shared by every suffix array / SBT / wavelet tree built from it at any block size in
//! `[1, 8]`, which is why the padding rounds to [`D_MAX`] rather than to a particular build's
//! `d`.

use std::path::Path;

use crate::alphabet::Symbol;
use crate::error::{DiskDexError, Result};
use crate::mmap::{ReadMapping, WriteMapping};
use crate::packed::{self, PackedSymbolView};

/// The largest block size this crate supports; `CompressedDnaFile` always pads the symbol count
/// to a multiple of this so the same file backs any `d` in `[1, D_MAX]`.
pub const D_MAX: usize = 8;

const HEADER_BYTES: usize = 8;

/// Pads `symbols` in place: ensure the stream ends in [`Symbol::Term`], then round its length up
/// to a multiple of [`D_MAX`] with trailing `Term` symbols.
pub fn pad_symbols(symbols: &mut Vec<Symbol>) {
    if symbols.last() != Some(&Symbol::Term) {
        symbols.push(Symbol::Term);
    }
    let padded_len = symbols.len().next_multiple_of(D_MAX);
    symbols.resize(padded_len, Symbol::Term);
}

/// Builds a `*.comp` file at `path` from an already-padded symbol stream (see [`pad_symbols`]).
///
/// Returns the number of symbols written (`symbols.len()`).
pub fn build(path: impl AsRef<Path>, symbols: &[Symbol]) -> Result<usize> {
    let count = symbols.len();
    let body_bytes = packed::packed_byte_len(count);
    let total_bytes = HEADER_BYTES + body_bytes;

    let mut mapping = WriteMapping::create(path, total_bytes)?;
    let bytes = mapping.as_bytes_mut();
    bytes[..HEADER_BYTES].copy_from_slice(&(count as u64).to_le_bytes());

    let body = &mut bytes[HEADER_BYTES..];
    for (i, &symbol) in symbols.iter().enumerate() {
        packed::write_at(body, i, symbol);
    }

    mapping.flush()?;
    Ok(count)
}

/// A read-only, memory-mapped view over a built `*.comp` file.
pub struct CompressedDnaFile {
    mapping: ReadMapping,
    count: usize,
}

impl CompressedDnaFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mapping = ReadMapping::open(path)?;
        if mapping.len() < HEADER_BYTES {
            return Err(DiskDexError::Corrupt(format!(
                "{} is smaller than the compressed-text header",
                path.display()
            )));
        }

        let count = u64::from_le_bytes(mapping.as_bytes()[..HEADER_BYTES].try_into().unwrap());
        let count = usize::try_from(count)
            .map_err(|_| DiskDexError::Corrupt("symbol count overflows usize".to_string()))?;

        let expected_bytes = HEADER_BYTES + packed::packed_byte_len(count);
        if mapping.len() != expected_bytes {
            return Err(DiskDexError::Corrupt(format!(
                "{} has {} bytes, expected {} for {} symbols",
                path.display(),
                mapping.len(),
                expected_bytes,
                count
            )));
        }

        Ok(Self { mapping, count })
    }

    /// Total number of (padded) symbols, including the trailing `Term` sentinels.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn symbols(&self) -> PackedSymbolView<'_> {
        PackedSymbolView::new(&self.mapping.as_bytes()[HEADER_BYTES..], self.count)
    }
}
