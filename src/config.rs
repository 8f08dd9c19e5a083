//! Build-time configuration knobs, exposed through a small builder struct.

use crate::error::DiskDexError;

/// The super-symbol block width `d`, checked to lie in `[1, 8]` at construction time.
///
/// `d` is a runtime value rather than a const generic: one binary can build and query indices
/// for any supported block width, at the cost of `d` being threaded through explicitly wherever
/// it matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockSize(u8);

impl BlockSize {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 8;

    pub fn new(d: u8) -> Result<Self, DiskDexError> {
        if (Self::MIN..=Self::MAX).contains(&d) {
            Ok(Self(d))
        } else {
            Err(DiskDexError::InputOutOfRange(format!(
                "block size d={d} must be in [{}, {}]",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    pub const fn is_unblocked(self) -> bool {
        self.0 == 1
    }
}

impl Default for BlockSize {
    fn default() -> Self {
        Self(1)
    }
}

/// The typical on-disk block size for String B-Tree nodes.
pub const DEFAULT_SBT_BLOCK_SIZE: usize = 4096;

/// Build-time configuration for constructing an index.
///
/// This index is not suffix-array-sampled: every suffix array entry is stored. The SBT
/// block-size knob `d` is what trades space for query flexibility here instead.
#[derive(Debug, Clone, Copy)]
pub struct BuildConfig {
    pub block_size: BlockSize,
    pub sbt_block_bytes: usize,
}

impl BuildConfig {
    pub fn new(block_size: BlockSize) -> Self {
        Self {
            block_size,
            sbt_block_bytes: DEFAULT_SBT_BLOCK_SIZE,
        }
    }

    /// Overrides the on-disk SBT block size. Mainly useful for tests, which want small blocks
    /// so that multi-level trees can be exercised without building gigabytes of text.
    pub fn sbt_block_bytes(self, sbt_block_bytes: usize) -> Self {
        Self {
            sbt_block_bytes,
            ..self
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::new(BlockSize::default())
    }
}
