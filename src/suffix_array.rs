//! Parallel prefix-doubling suffix-array construction, and the `*.sa` on-disk artifact.
//!
//! The construction follows the classic Karp-Miller-Rosenberg / Manber-Myers doubling scheme:
//! start from per-super-symbol ranks, then repeatedly double the compared prefix length by
//! pairing each item's current rank with the rank of the item `h` positions to its right,
//! re-sorting, and re-ranking densely. The comparison sort is the only parallel step (via
//! rayon's `par_sort_unstable_by`); re-ranking is an inherently sequential scan over the freshly
//! sorted order.

use std::path::Path;

use rayon::prelude::*;

use crate::error::{DiskDexError, Result};
use crate::mmap::{ReadMapping, WriteMapping};
use crate::packed::PackedSymbolView;

const HEADER_BYTES: usize = 8;

/// Sorts `n_items = text.len() / d` super-symbol positions into suffix-lexicographic order.
///
/// Positions are super-symbol indices: position `i` denotes the suffix starting at symbol
/// offset `i * d`. For `d == 1` these coincide with raw symbol offsets.
pub fn build_suffix_array(text: PackedSymbolView<'_>, d: usize) -> Result<Vec<u32>> {
    let n_items = text.len() / d;
    if n_items > u32::MAX as usize {
        return Err(DiskDexError::InputOutOfRange(format!(
            "{n_items} suffix array items exceeds u32 range"
        )));
    }
    if n_items == 0 {
        return Ok(Vec::new());
    }

    let mut rank: Vec<i64> = (0..n_items)
        .map(|i| text.read_seq(i * d, d).as_u32() as i64)
        .collect();
    let mut sa: Vec<u32> = (0..n_items as u32).collect();

    let mut h = 1usize;
    loop {
        let key = |pos: u32, h: usize| -> (i64, i64) {
            let i = pos as usize;
            let r0 = rank[i];
            let r1 = if i + h < n_items { rank[i + h] } else { -1 };
            (r0, r1)
        };

        sa.par_sort_unstable_by(|&a, &b| key(a, h).cmp(&key(b, h)));

        let mut new_rank = vec![0i64; n_items];
        let mut cur_rank = 0i64;
        new_rank[sa[0] as usize] = 0;
        let mut prev_key = key(sa[0], h);
        for &pos in &sa[1..] {
            let this_key = key(pos, h);
            if this_key != prev_key {
                cur_rank += 1;
            }
            new_rank[pos as usize] = cur_rank;
            prev_key = this_key;
        }

        rank = new_rank;

        if cur_rank as usize == n_items - 1 {
            break;
        }
        if h >= n_items {
            break;
        }
        h *= 2;
    }

    Ok(sa)
}

/// Builds a `*.sa` file at `path` from an already-sorted suffix array.
pub fn build(path: impl AsRef<Path>, sa: &[u32]) -> Result<()> {
    let total_bytes = HEADER_BYTES + sa.len() * std::mem::size_of::<u32>();
    let mut mapping = WriteMapping::create(path, total_bytes)?;
    let bytes = mapping.as_bytes_mut();
    bytes[..HEADER_BYTES].copy_from_slice(&(sa.len() as u64).to_le_bytes());

    let body = &mut bytes[HEADER_BYTES..];
    for (chunk, &value) in body.chunks_exact_mut(4).zip(sa) {
        chunk.copy_from_slice(&value.to_le_bytes());
    }

    mapping.flush()
}

/// A read-only, memory-mapped view over a built `*.sa` file.
pub struct SuffixArrayFile {
    mapping: ReadMapping,
    count: usize,
}

impl SuffixArrayFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mapping = ReadMapping::open(path)?;
        if mapping.len() < HEADER_BYTES {
            return Err(DiskDexError::Corrupt(format!(
                "{} is smaller than the suffix-array header",
                path.display()
            )));
        }

        let count = u64::from_le_bytes(mapping.as_bytes()[..HEADER_BYTES].try_into().unwrap());
        let count = usize::try_from(count)
            .map_err(|_| DiskDexError::Corrupt("suffix array count overflows usize".to_string()))?;

        let expected_bytes = HEADER_BYTES + count * std::mem::size_of::<u32>();
        if mapping.len() != expected_bytes {
            return Err(DiskDexError::Corrupt(format!(
                "{} has {} bytes, expected {} for {} entries",
                path.display(),
                mapping.len(),
                expected_bytes,
                count
            )));
        }

        Ok(Self { mapping, count })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn get(&self, index: usize) -> u32 {
        debug_assert!(index < self.count, "suffix array index {index} out of range");
        let offset = HEADER_BYTES + index * 4;
        u32::from_le_bytes(
            self.mapping.as_bytes()[offset..offset + 4]
                .try_into()
                .unwrap(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.count).map(move |i| self.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Symbol;
    use crate::packed::PackedSymbolBuffer;

    fn packed_from(s: &str) -> PackedSymbolBuffer {
        let symbols: Vec<_> = s.bytes().map(|b| Symbol::from_ascii(b).unwrap()).collect();
        let mut buf = PackedSymbolBuffer::with_len(symbols.len() + 1);
        for (i, s) in symbols.into_iter().enumerate() {
            buf.write(i, s);
        }
        buf.write(s.len(), Symbol::Term);
        buf
    }

    fn naive_suffix_order(symbols: &[Symbol]) -> Vec<u32> {
        let n = symbols.len();
        let mut sa: Vec<u32> = (0..n as u32).collect();
        sa.sort_by(|&a, &b| symbols[a as usize..].cmp(&symbols[b as usize..]));
        sa
    }

    #[test]
    fn matches_naive_sort_unblocked() {
        let buf = packed_from("ACGTACGT");
        let n = buf.len();
        let symbols: Vec<_> = (0..n).map(|i| buf.read(i)).collect();

        let view = crate::packed::PackedSymbolView::new(buf.as_bytes(), n);
        let sa = build_suffix_array(view, 1).unwrap();

        assert_eq!(sa, naive_suffix_order(&symbols));
    }

    #[test]
    fn suffix_array_is_strictly_increasing() {
        let buf = packed_from("AAAAAAA");
        let n = buf.len();
        let view = crate::packed::PackedSymbolView::new(buf.as_bytes(), n);
        let sa = build_suffix_array(view, 1).unwrap();

        for w in sa.windows(2) {
            let a = &buf;
            let suffix_a: Vec<_> = (w[0] as usize..n).map(|i| a.read(i)).collect();
            let suffix_b: Vec<_> = (w[1] as usize..n).map(|i| a.read(i)).collect();
            assert!(suffix_a < suffix_b);
        }
    }

    #[test]
    fn build_then_open_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text.sa");

        let sa = vec![3u32, 1, 4, 1, 5, 9, 2, 6];
        build(&path, &sa).unwrap();

        let file = SuffixArrayFile::open(&path).unwrap();
        assert_eq!(file.len(), sa.len());
        assert_eq!(file.iter().collect::<Vec<_>>(), sa);
    }
}
