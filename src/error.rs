//! Typed errors surfaced at every public API boundary of this crate.
//!
//! No internal retries are attempted anywhere in this crate: a fallible operation either
//! succeeds or returns one of these variants, and the caller decides what to do (including,
//! for build operations, unlinking a partially-written output file).

/// The single error type returned by every fallible operation in this crate.
#[derive(thiserror::Error, Debug)]
pub enum DiskDexError {
    /// File open, read, write, mmap or truncate failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A memory mapping could not be created or grown.
    #[error("mmap error: {0}")]
    Mmap(String),

    /// An input value (e.g. block size `d`, pattern length, item count) is outside the
    /// range this crate can operate on.
    #[error("input out of range: {0}")]
    InputOutOfRange(String),

    /// A size mismatch between companion files, a misaligned file length, or an
    /// out-of-range offset was observed while reading a file this crate wrote.
    #[error("corrupt file: {0}")]
    Corrupt(String),

    /// A Patricia trie could not be serialized into its reserved block budget.
    #[error("patricia trie capacity exceeded: {num_leaves} leaves need more than {budget} bytes")]
    CapacityExceeded { num_leaves: usize, budget: usize },

    /// A pattern byte was outside the alphabet recognized by the index.
    #[error("invalid symbol byte: {0:#04x}")]
    InvalidSymbol(u8),
}

pub type Result<T> = std::result::Result<T, DiskDexError>;
