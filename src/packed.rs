//! Bit-packed symbol storage: 3 bits per [`Symbol`], big-endian within each byte.
//!
//! This is the foundation every other on-disk format in this crate is built on. Symbol `i`
//! occupies bits `[3i, 3i+3)` counting from the most-significant bit of byte `i*3/8`, so a
//! sequence of packed symbols compares the same way byte-wise as it does symbol-wise, as long
//! as any trailing padding bits are zero.

use crate::alphabet::Symbol;

/// A growable, bit-packed store of [`Symbol`]s, 3 bits each, big-endian within a byte.
#[derive(Debug, Clone)]
pub struct PackedSymbolBuffer {
    bytes: Vec<u8>,
    len: usize,
}

/// Number of bytes needed to store `num_symbols` packed symbols.
pub fn packed_byte_len(num_symbols: usize) -> usize {
    (num_symbols * 3).div_ceil(8)
}

impl PackedSymbolBuffer {
    /// Creates an all-`TERM` buffer holding `num_symbols` symbols.
    pub fn with_len(num_symbols: usize) -> Self {
        Self {
            bytes: vec![0u8; packed_byte_len(num_symbols)],
            len: num_symbols,
        }
    }

    /// Wraps an existing packed byte buffer. `len` must not exceed the number of symbols that
    /// fit in `bytes`; this is a programmer invariant, not something checked against untrusted
    /// input (callers reading an on-disk file validate the header count against the file size
    /// before calling this).
    pub fn from_raw(bytes: Vec<u8>, len: usize) -> Self {
        debug_assert!(packed_byte_len(len) <= bytes.len());
        Self { bytes, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    fn bit_position(index: usize) -> (usize, u32) {
        let bit = index * 3;
        (bit / 8, (bit % 8) as u32)
    }

    /// Reads the symbol at position `index`.
    ///
    /// Out-of-range `index` is a programming error: every caller in this crate either has
    /// `index` bounded by a length it trusts (a `CompressedDnaFile`'s header count) or is
    /// iterating `0..len()`.
    pub fn read(&self, index: usize) -> Symbol {
        debug_assert!(index < self.len, "symbol index {index} out of range");
        read_at(&self.bytes, index)
    }

    /// Writes `symbol` at position `index`, preserving every other bit in the touched byte(s)
    /// (read-modify-write).
    pub fn write(&mut self, index: usize, symbol: Symbol) {
        debug_assert!(index < self.len, "symbol index {index} out of range");
        write_at(&mut self.bytes, index, symbol);
    }

    /// Extracts the packed `d`-tuple (super-symbol) starting at symbol index `start`, as a
    /// freshly MSB-aligned [`SymbolSeq`].
    ///
    /// Positions past `len()` are treated as [`Symbol::Term`], so that a super-symbol at the
    /// tail of the text can still be formed without a separate padding pass (the terminator
    /// compares smallest, which is exactly what "off the end of the text" should do).
    pub fn read_seq(&self, start: usize, d: usize) -> SymbolSeq {
        read_seq_at(&self.bytes, self.len, start, d)
    }
}

/// Reads the symbol at `index` out of a raw packed byte slice, with no length check of its own
/// (the caller is expected to have one: a [`PackedSymbolBuffer`]'s `len`, or a mmap-backed
/// `CompressedDnaFile`'s header count).
pub(crate) fn read_at(bytes: &[u8], index: usize) -> Symbol {
    let bit = index * 3;
    let byte_index = bit / 8;
    let local_bit = (bit % 8) as u32;

    let raw = if local_bit <= 5 {
        let shift = 5 - local_bit;
        (bytes[byte_index] >> shift) & 0b111
    } else {
        let high_bits = 8 - local_bit;
        let low_bits = 3 - high_bits;
        let high = bytes[byte_index] & ((1u8 << high_bits) - 1);
        let low = bytes[byte_index + 1] >> (8 - low_bits);
        (high << low_bits) | low
    };

    Symbol::from_u8(raw)
}

/// Writes `symbol` at `index` into a raw packed byte slice (read-modify-write).
pub(crate) fn write_at(bytes: &mut [u8], index: usize, symbol: Symbol) {
    let bit = index * 3;
    let byte_index = bit / 8;
    let local_bit = (bit % 8) as u32;
    let value = symbol.to_u8();

    if local_bit <= 5 {
        let shift = 5 - local_bit;
        let mask = 0b111u8 << shift;
        bytes[byte_index] = (bytes[byte_index] & !mask) | (value << shift);
    } else {
        let high_bits = 8 - local_bit;
        let low_bits = 3 - high_bits;

        let high_mask = (1u8 << high_bits) - 1;
        bytes[byte_index] = (bytes[byte_index] & !high_mask) | (value >> low_bits);

        let low_shift = 8 - low_bits;
        let low_mask = ((1u8 << low_bits) - 1) << low_shift;
        bytes[byte_index + 1] =
            (bytes[byte_index + 1] & !low_mask) | ((value & ((1 << low_bits) - 1)) << low_shift);
    }
}

fn read_seq_at(bytes: &[u8], len: usize, start: usize, d: usize) -> SymbolSeq {
    let mut seq = SymbolSeq::zeroed(d);
    for k in 0..d {
        let symbol = if start + k < len {
            read_at(bytes, start + k)
        } else {
            Symbol::Term
        };
        seq.set(k, symbol);
    }
    seq
}

/// A borrowed, read-only view over packed symbol bytes, for indices backed directly by a
/// memory-mapped file rather than an owned [`PackedSymbolBuffer`].
#[derive(Debug, Clone, Copy)]
pub struct PackedSymbolView<'a> {
    bytes: &'a [u8],
    len: usize,
}

impl<'a> PackedSymbolView<'a> {
    pub fn new(bytes: &'a [u8], len: usize) -> Self {
        debug_assert!(packed_byte_len(len) <= bytes.len());
        Self { bytes, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn read(&self, index: usize) -> Symbol {
        debug_assert!(index < self.len, "symbol index {index} out of range");
        read_at(self.bytes, index)
    }

    pub fn read_seq(&self, start: usize, d: usize) -> SymbolSeq {
        read_seq_at(self.bytes, self.len, start, d)
    }
}

/// A packed `d`-tuple of symbols ("super-symbol"), treated as one lexicographic unit.
///
/// The packed bytes are always MSB-aligned starting at bit 0 of byte 0 (independent of where
/// the tuple originated in some larger [`PackedSymbolBuffer`]), so `SymbolSeq`'s `Ord` impl
/// (ordinary byte-slice comparison) is equivalent to lexicographic comparison of the decoded
/// symbols, and also doubles as a compact sort/rank key (see [`SymbolSeq::as_u32`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSeq {
    bytes: Vec<u8>,
    d: usize,
}

impl SymbolSeq {
    fn zeroed(d: usize) -> Self {
        Self {
            bytes: vec![0u8; packed_byte_len(d)],
            d,
        }
    }

    fn set(&mut self, k: usize, symbol: Symbol) {
        write_at(&mut self.bytes, k, symbol);
    }

    pub fn d(&self) -> usize {
        self.d
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decodes the symbols back out, mostly useful for tests and debugging.
    pub fn symbols(&self) -> Vec<Symbol> {
        let buf = PackedSymbolBuffer::from_raw(self.bytes.clone(), self.d);
        (0..self.d).map(|k| buf.read(k)).collect()
    }

    /// Interprets the packed, zero-padded bytes as a big-endian unsigned integer.
    ///
    /// Because the packing is MSB-aligned with zero padding after the last symbol, this value
    /// sorts identically to the `SymbolSeq` itself, and to the symbol sequence it encodes. For
    /// `d <= 8` this fits comfortably in a `u32` (at most 24 significant bits), which is the
    /// representation the suffix-array builder uses as its sort/rank key.
    pub fn as_u32(&self) -> u32 {
        let mut value = 0u32;
        for &b in &self.bytes {
            value = (value << 8) | b as u32;
        }
        value
    }
}

impl PartialOrd for SymbolSeq {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SymbolSeq {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_symbol() -> impl Strategy<Value = Symbol> {
        (0u8..6).prop_map(Symbol::from_u8)
    }

    #[test]
    fn round_trip_single_writes() {
        let mut buf = PackedSymbolBuffer::with_len(20);
        let symbols = [
            Symbol::A,
            Symbol::C,
            Symbol::T,
            Symbol::G,
            Symbol::N,
            Symbol::Term,
        ];

        for (i, &s) in symbols.iter().cycle().take(20).enumerate() {
            buf.write(i, s);
        }

        for (i, &s) in symbols.iter().cycle().take(20).enumerate() {
            assert_eq!(buf.read(i), s, "mismatch at {i}");
        }
    }

    proptest! {
        #[test]
        fn packing_round_trip(values in prop::collection::vec(arb_symbol(), 0..200)) {
            let mut buf = PackedSymbolBuffer::with_len(values.len());
            for (i, &s) in values.iter().enumerate() {
                buf.write(i, s);
            }
            for (i, &s) in values.iter().enumerate() {
                prop_assert_eq!(buf.read(i), s);
            }
        }

        #[test]
        fn write_does_not_disturb_other_positions(
            values in prop::collection::vec(arb_symbol(), 1..200),
            touch_index in 0usize..199,
            new_symbol in arb_symbol(),
        ) {
            let touch_index = touch_index % values.len();
            let mut buf = PackedSymbolBuffer::with_len(values.len());
            for (i, &s) in values.iter().enumerate() {
                buf.write(i, s);
            }

            buf.write(touch_index, new_symbol);

            for (i, &s) in values.iter().enumerate() {
                if i == touch_index {
                    prop_assert_eq!(buf.read(i), new_symbol);
                } else {
                    prop_assert_eq!(buf.read(i), s);
                }
            }
        }

        #[test]
        fn symbol_seq_order_matches_lexicographic_order(
            a in prop::collection::vec(arb_symbol(), 1..8),
            b in prop::collection::vec(arb_symbol(), 1..8),
        ) {
            let d = a.len().max(b.len());

            let mut buf_a = PackedSymbolBuffer::with_len(d);
            for (i, &s) in a.iter().enumerate() {
                buf_a.write(i, s);
            }
            let mut buf_b = PackedSymbolBuffer::with_len(d);
            for (i, &s) in b.iter().enumerate() {
                buf_b.write(i, s);
            }

            let seq_a = buf_a.read_seq(0, d);
            let seq_b = buf_b.read_seq(0, d);

            let padded_a: Vec<_> = (0..d).map(|i| a.get(i).copied().unwrap_or(Symbol::Term)).collect();
            let padded_b: Vec<_> = (0..d).map(|i| b.get(i).copied().unwrap_or(Symbol::Term)).collect();

            prop_assert_eq!(seq_a.cmp(&seq_b), padded_a.cmp(&padded_b));
            prop_assert_eq!(seq_a.as_u32().cmp(&seq_b.as_u32()), padded_a.cmp(&padded_b));
        }
    }
}
