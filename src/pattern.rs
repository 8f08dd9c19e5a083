//! Transient pattern storage, and the `SymbolSource` abstraction shared by patterns and text.
//!
//! Patterns are transient: an owning `PatternBuffer` holds the packed bits and yields a borrowed
//! accessor. Patricia-trie search needs to read both a query pattern and the indexed text through
//! the same interface, so `SymbolSource` is that interface: read symbol `i`, treating anything
//! past the end as [`Symbol::Term`].

use crate::alphabet::Symbol;
use crate::packed::{PackedSymbolBuffer, PackedSymbolView};

/// A sequence of symbols that can be read by absolute index, treating out-of-range reads as
/// [`Symbol::Term`] rather than panicking — this is what lets Patricia-trie search compare a
/// short pattern against node depths beyond its own length without a separate bounds check at
/// every call site.
pub trait SymbolSource {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn symbol_at(&self, index: usize) -> Symbol;
}

impl SymbolSource for PackedSymbolBuffer {
    fn len(&self) -> usize {
        PackedSymbolBuffer::len(self)
    }

    fn symbol_at(&self, index: usize) -> Symbol {
        if index < PackedSymbolBuffer::len(self) {
            self.read(index)
        } else {
            Symbol::Term
        }
    }
}

impl SymbolSource for PackedSymbolView<'_> {
    fn len(&self) -> usize {
        PackedSymbolView::len(self)
    }

    fn symbol_at(&self, index: usize) -> Symbol {
        if index < PackedSymbolView::len(self) {
            self.read(index)
        } else {
            Symbol::Term
        }
    }
}

/// Owns the packed bits of a query pattern; [`PatternBuffer::accessor`] yields the borrowed
/// [`SymbolSource`] that search actually reads through.
pub struct PatternBuffer {
    buf: PackedSymbolBuffer,
}

impl PatternBuffer {
    pub fn from_symbols(symbols: &[Symbol]) -> Self {
        let mut buf = PackedSymbolBuffer::with_len(symbols.len());
        for (i, &s) in symbols.iter().enumerate() {
            buf.write(i, s);
        }
        Self { buf }
    }

    /// Parses an ASCII pattern string the same way input text is parsed: recognized alphabet
    /// bytes only, everything else silently dropped. Unlike text ingestion, no terminator is
    /// appended — a query pattern has no intrinsic end-of-text marker.
    pub fn from_ascii(text: &str) -> Self {
        let mut symbols = Vec::with_capacity(text.len());
        for byte in text.bytes() {
            if let Ok(symbol) = Symbol::from_ascii(byte) {
                symbols.push(symbol);
            }
        }
        Self::from_symbols(&symbols)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn accessor(&self) -> PatternAccessor<'_> {
        PatternAccessor { buf: &self.buf }
    }
}

/// Borrowed, read-only view over a [`PatternBuffer`]'s packed bits.
#[derive(Clone, Copy)]
pub struct PatternAccessor<'a> {
    buf: &'a PackedSymbolBuffer,
}

impl SymbolSource for PatternAccessor<'_> {
    fn len(&self) -> usize {
        self.buf.len()
    }

    fn symbol_at(&self, index: usize) -> Symbol {
        if index < self.buf.len() {
            self.buf.read(index)
        } else {
            Symbol::Term
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_ascii_drops_unrecognized_bytes() {
        let pattern = PatternBuffer::from_ascii("ac-gt!N");
        assert_eq!(pattern.len(), 6);
        let acc = pattern.accessor();
        assert_eq!(acc.symbol_at(0), Symbol::A);
        assert_eq!(acc.symbol_at(5), Symbol::N);
    }

    #[test]
    fn reads_past_end_yield_term() {
        let pattern = PatternBuffer::from_symbols(&[Symbol::A, Symbol::C]);
        let acc = pattern.accessor();
        assert_eq!(acc.symbol_at(0), Symbol::A);
        assert_eq!(acc.symbol_at(1), Symbol::C);
        assert_eq!(acc.symbol_at(2), Symbol::Term);
        assert_eq!(acc.symbol_at(100), Symbol::Term);
    }
}
