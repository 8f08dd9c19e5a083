//! Disk-resident genomic text index: String B-Tree over a suffix array of super-symbols, with a
//! wavelet tree over the super-symbol BWT to resolve patterns whose length isn't a multiple of
//! the block width `d`.
//!
//! Build data flow: raw text -> [`comp_file::CompressedDnaFile`] -> [`suffix_array::SuffixArrayFile`]
//! -> [`sbt`] file (+ a [`wavelet_tree`] file when `d > 1`). Query data flow: pattern bytes ->
//! [`pattern::PatternBuffer`] -> [`sbt::StringBTreeFile::search`] -> `(sa_lo, sa_hi, matched_len)`,
//! refined through the wavelet tree when the pattern's length isn't a multiple of `d`.

pub mod alphabet;
pub mod bwt;
pub mod comp_file;
pub mod config;
pub mod error;
pub mod input;
pub mod mmap;
pub mod packed;
pub mod patricia_trie;
pub mod pattern;
pub mod sbt;
pub mod suffix_array;
pub mod wavelet_tree;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use alphabet::{BITS_PER_SYMBOL, Symbol};
use comp_file::CompressedDnaFile;
use config::BuildConfig;
use error::Result;
use pattern::{PatternBuffer, SymbolSource};
use sbt::StringBTreeFile;
use suffix_array::SuffixArrayFile;
use wavelet_tree::WaveletTreeFile;

/// The on-disk artifact paths derived from one input text path and block size:
/// `{path}.comp`, `{path}.comp.sa[.dN]`, `{path}.comp.sbt[.dN]`, `{path}.comp.wt[.dN]`.
/// The `.dN` suffix is omitted for the unblocked case (`d == 1`), since that's the only block
/// size that can ever be built without one.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub comp: PathBuf,
    pub sa: PathBuf,
    pub sbt: PathBuf,
    pub wt: PathBuf,
}

pub fn artifact_paths(input_path: impl AsRef<Path>, block_size: config::BlockSize) -> ArtifactPaths {
    let comp = append_extension(input_path.as_ref(), "comp");
    let suffix = if block_size.is_unblocked() {
        String::new()
    } else {
        format!(".d{}", block_size.get())
    };
    ArtifactPaths {
        sa: append_extension(&comp, &format!("sa{suffix}")),
        sbt: append_extension(&comp, &format!("sbt{suffix}")),
        wt: append_extension(&comp, &format!("wt{suffix}")),
        comp,
    }
}

fn append_extension(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".");
    s.push(suffix);
    PathBuf::from(s)
}

/// Reads a FASTA-like input file, pads it, and builds every on-disk artifact for `config`'s
/// block size. Returns the paths written.
pub fn build_from_path(input_path: impl AsRef<Path>, config: &BuildConfig) -> Result<ArtifactPaths> {
    let input_path = input_path.as_ref();
    log::info!("reading input text from {}", input_path.display());

    let file = File::open(input_path)?;
    let reader = input::Reader::new(BufReader::new(file));
    let mut symbols = Vec::new();
    reader.read_all(&mut symbols)?;
    comp_file::pad_symbols(&mut symbols);
    log::info!("padded input to {} symbols", symbols.len());

    let paths = artifact_paths(input_path, config.block_size);
    comp_file::build(&paths.comp, &symbols)?;
    log::info!("wrote {}", paths.comp.display());

    let comp = CompressedDnaFile::open(&paths.comp)?;
    let text = comp.symbols();
    let d = config.block_size.as_usize();

    let sa = suffix_array::build_suffix_array(text, d)?;
    suffix_array::build(&paths.sa, &sa)?;
    log::info!("wrote {} ({} suffix array entries)", paths.sa.display(), sa.len());

    sbt::build(&paths.sbt, text, &sa, d, config.sbt_block_bytes)?;
    log::info!("wrote {}", paths.sbt.display());

    if !config.block_size.is_unblocked() {
        let bwt_values = bwt::build_bwt(text, &sa, d);
        let alphabet_size = 1usize << (BITS_PER_SYMBOL as usize * d);
        wavelet_tree::build(&paths.wt, &bwt_values, alphabet_size)?;
        log::info!("wrote {}", paths.wt.display());
    }

    Ok(paths)
}

/// Outcome of [`DnaIndex::query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryResult {
    pub matched: bool,
    pub str_pos: u32,
    pub sa_lo: u32,
    pub sa_hi: u32,
    pub matched_len: u32,
    /// Number of suffix-array entries confirmed to carry a full match. For an aligned pattern
    /// (length a multiple of `d`, or `d == 1`) this is exactly `sa_hi - sa_lo`. For a gapped
    /// pattern refined through the wavelet tree, `[sa_lo, sa_hi)` is the (possibly looser) range
    /// the SBT matched on the aligned remainder; `occurrence_count` is the number of those
    /// entries the wavelet-tree refinement actually confirmed.
    pub occurrence_count: usize,
}

/// An opened, query-ready index: the compressed text, suffix array, String B-Tree, and (when
/// `d > 1`) wavelet tree over the BWT of super-symbols.
pub struct DnaIndex {
    comp: CompressedDnaFile,
    sa: SuffixArrayFile,
    sbt: StringBTreeFile,
    wt: Option<WaveletTreeFile>,
    d: usize,
}

impl DnaIndex {
    pub fn open(input_path: impl AsRef<Path>, config: &BuildConfig) -> Result<Self> {
        let paths = artifact_paths(input_path, config.block_size);
        let comp = CompressedDnaFile::open(&paths.comp)?;
        let sa = SuffixArrayFile::open(&paths.sa)?;
        let sbt = StringBTreeFile::open(&paths.sbt, config.sbt_block_bytes)?;
        let d = config.block_size.as_usize();
        let wt = if config.block_size.is_unblocked() {
            None
        } else {
            Some(WaveletTreeFile::open(&paths.wt)?)
        };
        Ok(Self { comp, sa, sbt, wt, d })
    }

    /// The `str_pos` of the lexicographically smallest suffix, i.e. what an empty pattern
    /// resolves to.
    pub fn leftmost_str_pos(&self) -> u32 {
        self.sbt.leftmost_str_pos()
    }

    /// Searches for `pattern`, returning its match status and the range of suffix-array entries
    /// that carry it.
    ///
    /// When `pattern.len()` is a multiple of `d` (always true when `d == 1`), this is a direct
    /// [`StringBTreeFile::search`]. Otherwise the pattern is split at its last `d`-aligned
    /// boundary into a leading fragment (the `pattern.len() % d` symbols that don't fill a whole
    /// super-symbol) and an aligned remainder; the remainder is searched on the SBT as usual, and
    /// the leading fragment — which occupies the trailing, low-order symbol slots of whatever
    /// super-symbol immediately precedes the matched range — is checked against the wavelet tree
    /// built over the BWT of super-symbols.
    pub fn query(&self, pattern: &PatternBuffer) -> QueryResult {
        let text = self.comp.symbols();
        let accessor = pattern.accessor();
        let len = pattern.len();
        let head_len = len % self.d;

        if head_len == 0 || self.wt.is_none() {
            let outcome = self.sbt.search(&text, &accessor);
            return QueryResult {
                matched: outcome.matched(len),
                str_pos: outcome.str_pos,
                sa_lo: outcome.sa_lo,
                sa_hi: outcome.sa_hi,
                matched_len: outcome.matched_len,
                occurrence_count: (outcome.sa_hi - outcome.sa_lo) as usize,
            };
        }

        let head: Vec<Symbol> = (0..head_len).map(|i| accessor.symbol_at(i)).collect();
        let aligned: Vec<Symbol> = (head_len..len).map(|i| accessor.symbol_at(i)).collect();
        let aligned_len = aligned.len();
        let aligned_pattern = PatternBuffer::from_symbols(&aligned);
        let outcome = self.sbt.search(&text, &aligned_pattern.accessor());

        if !outcome.matched(aligned_len) {
            return QueryResult {
                matched: false,
                str_pos: outcome.str_pos,
                sa_lo: outcome.sa_lo,
                sa_hi: outcome.sa_hi,
                matched_len: outcome.matched_len,
                occurrence_count: 0,
            };
        }

        let wt = self.wt.as_ref().expect("checked above");
        let sig_bits = BITS_PER_SYMBOL * head_len as u32;
        let low_bits = head
            .iter()
            .fold(0u32, |acc, &s| (acc << BITS_PER_SYMBOL) | s.to_u8() as u32);

        let sa_lo = outcome.sa_lo as usize;
        let sa_hi = outcome.sa_hi as usize;
        let occurrence_count = wt.count_matching_low_bits_in_range(low_bits, sig_bits, sa_lo, sa_hi);

        if occurrence_count == 0 {
            return QueryResult {
                matched: false,
                str_pos: outcome.str_pos,
                sa_lo: outcome.sa_lo,
                sa_hi: outcome.sa_hi,
                matched_len: aligned_len as u32,
                occurrence_count: 0,
            };
        }

        let str_pos = self
            .first_gapped_match(sa_lo, sa_hi, &head, &text)
            .unwrap_or(outcome.str_pos);

        QueryResult {
            matched: true,
            str_pos,
            sa_lo: outcome.sa_lo,
            sa_hi: outcome.sa_hi,
            matched_len: len as u32,
            occurrence_count,
        }
    }

    /// Scans `[sa_lo, sa_hi)` (already narrowed to a small range by the SBT) for the
    /// lexicographically first suffix-array entry whose immediately preceding `head.len()`
    /// symbols equal `head`, confirming what [`WaveletTree::count_matching_low_bits_in_range`]
    /// only counted. The wavelet tree can tell us a match exists; recovering *which* original
    /// text position it's at isn't a contiguous-range operation the way an aligned match's
    /// `[sa_lo, sa_hi)` is (different completions of the free high-order bits land at unrelated
    /// suffix-array ranks), so this confirms by direct comparison instead.
    fn first_gapped_match(
        &self,
        sa_lo: usize,
        sa_hi: usize,
        head: &[Symbol],
        text: &packed::PackedSymbolView<'_>,
    ) -> Option<u32> {
        let head_len = head.len() as u32;
        for rank in sa_lo..sa_hi {
            let super_index = self.sa.get(rank);
            let aligned_str_pos = super_index * self.d as u32;
            if aligned_str_pos < head_len {
                // Would require wrapping to the end of the (terminator-padded) text; a real
                // pattern never starts with Term, so it can never match here.
                continue;
            }
            let candidate_str_pos = aligned_str_pos - head_len;
            let matches = (0..head.len())
                .all(|k| text.symbol_at(candidate_str_pos as usize + k) == head[k]);
            if matches {
                return Some(candidate_str_pos);
            }
        }
        None
    }
}
