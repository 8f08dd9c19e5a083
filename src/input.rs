//! FASTA-like input reading: strip header lines, keep only recognized alphabet bytes.
//!
//! A small `BufRead`-driven streaming reader, no whole-file slurp: a line starting with `>` is a
//! header and is skipped wholesale, everything else is scanned byte-by-byte and anything that
//! isn't one of `A C T G N` (case-insensitive) is silently dropped.

use std::io::BufRead;

use crate::alphabet::Symbol;
use crate::error::Result;

/// Reads symbols out of a FASTA-like byte stream, skipping header lines and discarding any byte
/// that doesn't translate to a [`Symbol`].
pub struct Reader<R> {
    inner: R,
    in_header: bool,
}

impl<R: BufRead> Reader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            in_header: false,
        }
    }

    /// Reads every recognized symbol out of the stream into `out`, in order.
    ///
    /// This does not append a terminator; callers that need one (building a
    /// [`crate::comp_file::CompressedDnaFile`]) add it themselves once the whole stream has been
    /// consumed.
    pub fn read_all(mut self, out: &mut Vec<Symbol>) -> Result<()> {
        let mut line = Vec::new();
        loop {
            line.clear();
            let bytes_read = self.inner.read_until(b'\n', &mut line)?;
            if bytes_read == 0 {
                break;
            }
            self.consume_line(&line, out);
        }
        Ok(())
    }

    fn consume_line(&mut self, line: &[u8], out: &mut Vec<Symbol>) {
        let mut rest = line;
        if !self.in_header && rest.first() == Some(&b'>') {
            self.in_header = true;
        }
        if self.in_header {
            if line.ends_with(b"\n") {
                self.in_header = false;
            }
            return;
        }
        while let Some(&byte) = rest.first() {
            if let Ok(symbol) = Symbol::from_ascii(byte) {
                out.push(symbol);
            }
            rest = &rest[1..];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read(data: &[u8]) -> Vec<Symbol> {
        let mut out = Vec::new();
        Reader::new(Cursor::new(data)).read_all(&mut out).unwrap();
        out
    }

    #[test]
    fn strips_header_lines() {
        let symbols = read(b">chr1 some description\nACGT\n>chr2\nNNAC\n");
        assert_eq!(
            symbols,
            vec![
                Symbol::A,
                Symbol::C,
                Symbol::G,
                Symbol::T,
                Symbol::N,
                Symbol::N,
                Symbol::A,
                Symbol::C,
            ]
        );
    }

    #[test]
    fn discards_unrecognized_bytes() {
        let symbols = read(b"AC GT\n\tN-ac\n");
        assert_eq!(
            symbols,
            vec![
                Symbol::A,
                Symbol::C,
                Symbol::G,
                Symbol::T,
                Symbol::N,
                Symbol::A,
                Symbol::C,
            ]
        );
    }

    #[test]
    fn header_without_trailing_newline_at_eof_is_still_skipped() {
        let symbols = read(b"ACGT\n>trailing header no newline");
        assert_eq!(symbols, vec![Symbol::A, Symbol::C, Symbol::G, Symbol::T]);
    }

    #[test]
    fn empty_input_yields_no_symbols() {
        assert!(read(b"").is_empty());
    }
}
