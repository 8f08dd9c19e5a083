//! Two-level rank/select bit vector: one block/superblock popcount scheme per level of the
//! wavelet tree, rather than interleaved per-symbol counters.
//!
//! Grounded on `text_with_rank_support::TextWithRankSupport`: the same superblock (`u16::MAX +
//! 1` bits) over block (64 bits) precomputed-popcount layout, with superblock offsets
//! accumulated sequentially after a per-superblock parallel fill. That structure interleaves one
//! bit-plane per *significant bit of a dense symbol* so a single `rank(symbol, idx)` query can
//! AND them together; this one stores a single plain bit vector per *wavelet-tree level*
//! instead, since each level only ever needs its own rank, not a cross-level combination.

use rayon::prelude::*;

const BLOCK_BITS: usize = 64;
const SUPERBLOCK_BITS: usize = u16::MAX as usize + 1;

/// A bit vector supporting O(1) `rank1`/`rank0` and binary-search `select1`/`select0`.
#[derive(Debug, Clone)]
pub struct RankBitVector {
    words: Vec<u64>,
    block_offsets: Vec<u32>,
    superblock_offsets: Vec<u64>,
    len: usize,
}

impl RankBitVector {
    /// Builds a rank-support bit vector from a slice of bits, filling blocks within each
    /// superblock in parallel via rayon's `par_chunks` and then accumulating superblock totals
    /// sequentially.
    pub fn build(bits: &[bool]) -> Self {
        let len = bits.len();
        let num_blocks = len.div_ceil(BLOCK_BITS);
        let num_superblocks = len.div_ceil(SUPERBLOCK_BITS);

        let mut words = vec![0u64; num_blocks];
        let mut block_offsets = vec![0u32; num_blocks];
        let mut superblock_offsets = vec![0u64; num_superblocks];

        let blocks_per_superblock = SUPERBLOCK_BITS / BLOCK_BITS;

        let bits_chunks = bits.par_chunks(SUPERBLOCK_BITS);
        let words_chunks = words.par_chunks_mut(blocks_per_superblock);
        let offsets_chunks = block_offsets.par_chunks_mut(blocks_per_superblock);
        let superblock_totals = superblock_offsets.par_iter_mut();

        (bits_chunks, words_chunks, offsets_chunks, superblock_totals)
            .into_par_iter()
            .for_each(|(bit_chunk, word_chunk, offset_chunk, total)| {
                let mut running = 0u32;
                for (block_idx, bit_block) in bit_chunk.chunks(BLOCK_BITS).enumerate() {
                    offset_chunk[block_idx] = running;
                    let mut word = 0u64;
                    for (i, &bit) in bit_block.iter().enumerate() {
                        if bit {
                            word |= 1u64 << i;
                        }
                    }
                    word_chunk[block_idx] = word;
                    running += word.count_ones();
                }
                *total = running as u64;
            });

        let mut running = 0u64;
        for total in superblock_offsets.iter_mut() {
            let count = *total;
            *total = running;
            running += count;
        }

        Self {
            words,
            block_offsets,
            superblock_offsets,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, pos: usize) -> bool {
        debug_assert!(pos < self.len);
        (self.words[pos / BLOCK_BITS] >> (pos % BLOCK_BITS)) & 1 == 1
    }

    /// Count of `1` bits in `[0, pos)`.
    pub fn rank1(&self, pos: usize) -> usize {
        debug_assert!(pos <= self.len);
        if pos == 0 {
            return 0;
        }
        let block_idx = pos / BLOCK_BITS;
        let bit_idx = pos % BLOCK_BITS;
        let superblock_idx = pos / SUPERBLOCK_BITS;

        let word = self.words[block_idx];
        let masked = if bit_idx == 0 {
            0
        } else {
            word & ((1u64 << bit_idx) - 1)
        };

        self.superblock_offsets[superblock_idx] as usize
            + self.block_offsets[block_idx] as usize
            + masked.count_ones() as usize
    }

    /// Count of `0` bits in `[0, pos)`.
    pub fn rank0(&self, pos: usize) -> usize {
        pos - self.rank1(pos)
    }

    /// Position of the `k`-th `1` bit (0-indexed): the `pos` with `get(pos)` true and exactly
    /// `k` one-bits before it. Implemented as a binary search over the monotone `rank1` function
    /// rather than a dedicated select table.
    pub fn select1(&self, k: usize) -> usize {
        let mut lo = 0usize;
        let mut hi = self.len;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.rank1(mid + 1) > k {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        lo
    }

    /// Position of the `k`-th `0` bit (0-indexed), analogous to [`RankBitVector::select1`].
    pub fn select0(&self, k: usize) -> usize {
        let mut lo = 0usize;
        let mut hi = self.len;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.rank0(mid + 1) > k {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        lo
    }

    /// Serializes as: `len: u64`, `num_blocks: u64`, words, `num_blocks` block offsets (`u32`
    /// each), `num_superblocks: u64`, superblock offsets (`u64` each). All integers little-endian.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.len as u64).to_le_bytes());
        out.extend_from_slice(&(self.words.len() as u64).to_le_bytes());
        for word in &self.words {
            out.extend_from_slice(&word.to_le_bytes());
        }
        for offset in &self.block_offsets {
            out.extend_from_slice(&offset.to_le_bytes());
        }
        out.extend_from_slice(&(self.superblock_offsets.len() as u64).to_le_bytes());
        for offset in &self.superblock_offsets {
            out.extend_from_slice(&offset.to_le_bytes());
        }
    }

    /// Inverse of [`RankBitVector::write_to`]; returns the parsed vector and the number of bytes
    /// consumed from `bytes`.
    pub fn read_from(bytes: &[u8]) -> (Self, usize) {
        let mut cursor = 0usize;
        let read_u64 = |bytes: &[u8], at: usize| u64::from_le_bytes(bytes[at..at + 8].try_into().unwrap());

        let len = read_u64(bytes, cursor) as usize;
        cursor += 8;
        let num_blocks = read_u64(bytes, cursor) as usize;
        cursor += 8;

        let mut words = Vec::with_capacity(num_blocks);
        for _ in 0..num_blocks {
            words.push(read_u64(bytes, cursor));
            cursor += 8;
        }

        let mut block_offsets = Vec::with_capacity(num_blocks);
        for _ in 0..num_blocks {
            block_offsets.push(u32::from_le_bytes(bytes[cursor..cursor + 4].try_into().unwrap()));
            cursor += 4;
        }

        let num_superblocks = read_u64(bytes, cursor) as usize;
        cursor += 8;
        let mut superblock_offsets = Vec::with_capacity(num_superblocks);
        for _ in 0..num_superblocks {
            superblock_offsets.push(read_u64(bytes, cursor));
            cursor += 8;
        }

        (
            Self {
                words,
                block_offsets,
                superblock_offsets,
                len,
            },
            cursor,
        )
    }
}
