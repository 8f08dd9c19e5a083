//! Burrows-Wheeler transform of a super-symbol suffix array, the array a wavelet tree is built
//! over for gapped (not-multiple-of-`d`) pattern matching.
//!
//! `BWT[i] = T[SA[i] - 1]`, with `SA[i] - 1` wrapping to the last position when `SA[i] == 0`.
//! Here each "position" is a super-symbol index, so `BWT[i]` is the packed super-symbol value
//! immediately preceding the one `SA[i]` points to.

use crate::packed::PackedSymbolView;

/// Builds the BWT-of-super-symbols array from an already-sorted suffix array (super-symbol
/// indices, as returned by [`crate::suffix_array::build_suffix_array`]).
pub fn build_bwt(text: PackedSymbolView<'_>, sa: &[u32], d: usize) -> Vec<u32> {
    let n_items = sa.len() as u32;
    sa.iter()
        .map(|&i| {
            let prev = if i == 0 { n_items - 1 } else { i - 1 };
            text.read_seq(prev as usize * d, d).as_u32()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Symbol;
    use crate::packed::PackedSymbolBuffer;
    use crate::suffix_array::build_suffix_array;

    fn packed_from(s: &str) -> PackedSymbolBuffer {
        let mut symbols: Vec<_> = s.bytes().map(|b| Symbol::from_ascii(b).unwrap()).collect();
        symbols.push(Symbol::Term);
        let mut buf = PackedSymbolBuffer::with_len(symbols.len());
        for (i, sym) in symbols.into_iter().enumerate() {
            buf.write(i, sym);
        }
        buf
    }

    #[test]
    fn matches_naive_predecessor_symbol_unblocked() {
        let buf = packed_from("ACGTACGT");
        let n = buf.len();
        let view = PackedSymbolView::new(buf.as_bytes(), n);
        let sa = build_suffix_array(view, 1).unwrap();
        let bwt = build_bwt(view, &sa, 1);

        for (i, &pos) in sa.iter().enumerate() {
            let expected = if pos == 0 {
                buf.read(n - 1)
            } else {
                buf.read(pos as usize - 1)
            };
            assert_eq!(bwt[i], expected.to_u8() as u32);
        }
    }
}
