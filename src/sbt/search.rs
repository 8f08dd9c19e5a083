//! `StringBTreeFile`: read-only, memory-mapped access to a built `*.sbt` file, and `search`.
//!
//! The main descent loop calls [`crate::patricia_trie::search`] once per node, carrying
//! `cur_lcp` forward as the running longest-common-prefix; `ext_pos` decoding at an Inner node
//! (the `off mod sizeof(InnerExtItem)` rule) is the one piece of interpretation `patricia_trie`
//! deliberately leaves to this module.

use std::cmp::Ordering;
use std::path::Path;

use crate::error::{DiskDexError, Result};
use crate::mmap::ReadMapping;
use crate::pattern::SymbolSource;
use crate::patricia_trie;
use crate::sbt::layout::NodeLayout;
use crate::sbt::node::{self, InnerExtItem, NodeType};

/// Outcome of [`StringBTreeFile::search`]: the position of the lexicographically smallest
/// matching suffix (or nearest neighbor, if no match), the `[sa_lo, sa_hi)` range of SA entries
/// sharing the matched prefix, and the length actually matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    pub str_pos: u32,
    pub sa_lo: u32,
    pub sa_hi: u32,
    pub matched_len: u32,
}

impl SearchOutcome {
    /// A pattern counts as matched only if it's fully matched *and* at least one suffix-array
    /// entry actually carries it: an empty `[sa_lo, sa_hi)` range means zero occurrences, which
    /// can never be reported as a match regardless of how much of the pattern matched.
    pub fn matched(&self, pattern_len: usize) -> bool {
        self.matched_len as usize >= pattern_len && self.sa_hi > self.sa_lo
    }
}

/// A read-only, memory-mapped view over a built `*.sbt` file.
pub struct StringBTreeFile {
    mapping: ReadMapping,
    layout: NodeLayout,
    num_blocks: usize,
    root_block: u32,
    leftmost_str: u32,
    rightmost_str: u32,
    n_items: u32,
}

impl StringBTreeFile {
    pub fn open(path: impl AsRef<Path>, sbt_block_bytes: usize) -> Result<Self> {
        let path = path.as_ref();
        let mapping = ReadMapping::open(path)?;
        if mapping.len() % sbt_block_bytes != 0 || mapping.is_empty() {
            return Err(DiskDexError::Corrupt(format!(
                "{} length {} is not a positive multiple of the block size {}",
                path.display(),
                mapping.len(),
                sbt_block_bytes
            )));
        }

        let layout = NodeLayout::for_block_size(sbt_block_bytes);
        let num_blocks = mapping.len() / sbt_block_bytes;
        let root_block = (num_blocks - 1) as u32;

        let mut file = Self {
            mapping,
            layout,
            num_blocks,
            root_block,
            leftmost_str: 0,
            rightmost_str: 0,
            n_items: 0,
        };

        file.leftmost_str = file.descend_leftmost(root_block).0;
        let (rightmost_str, rightmost_sa_left_size, rightmost_num_items) =
            file.descend_rightmost(root_block);
        file.rightmost_str = rightmost_str;
        file.n_items = rightmost_sa_left_size + rightmost_num_items;

        Ok(file)
    }

    fn block(&self, block_index: u32) -> &[u8] {
        let start = block_index as usize * self.layout.block_size;
        &self.mapping.as_bytes()[start..start + self.layout.block_size]
    }

    fn node_type(&self, block_index: u32) -> NodeType {
        node::read_type(self.block(block_index)).expect("corrupt node type tag")
    }

    /// Walks the leftmost-child chain from `block_index` down to a leaf, returning that leaf's
    /// first indexed `str_pos` and its `sa_left_size`.
    fn descend_leftmost(&self, mut block_index: u32) -> (u32, u32) {
        loop {
            let block = self.block(block_index);
            match node::read_type(block).expect("corrupt node type tag") {
                NodeType::Leaf => {
                    let ext = node::combined_region(block, &self.layout, NodeType::Leaf);
                    let begin = node::ext_pos_begin(&self.layout, NodeType::Leaf) as usize;
                    let str_pos = node::read_leaf_ext_item(&ext[begin..], 0);
                    return (str_pos, node::read_sa_left_size(block));
                }
                NodeType::Inner => {
                    let ext = node::combined_region(block, &self.layout, NodeType::Inner);
                    let begin = node::ext_pos_begin(&self.layout, NodeType::Inner) as usize;
                    let item = node::read_inner_ext_item(&ext[begin..], 0);
                    block_index = item.child_block;
                }
            }
        }
    }

    /// Walks the rightmost-child chain from `block_index` down to a leaf, returning that leaf's
    /// rightmost indexed `str_pos`, its `sa_left_size`, and its item count (the latter two give
    /// `n_items = sa_left_size + num_items` for the rightmost leaf in the whole file).
    fn descend_rightmost(&self, mut block_index: u32) -> (u32, u32, u32) {
        loop {
            let block = self.block(block_index);
            match node::read_type(block).expect("corrupt node type tag") {
                NodeType::Leaf => {
                    let ext = node::combined_region(block, &self.layout, NodeType::Leaf);
                    let begin = node::ext_pos_begin(&self.layout, NodeType::Leaf) as usize;
                    let num_items = node::read_num_items(block) as usize;
                    let str_pos = node::read_leaf_ext_item(&ext[begin..], num_items - 1);
                    return (str_pos, node::read_sa_left_size(block), num_items as u32);
                }
                NodeType::Inner => {
                    let ext = node::combined_region(block, &self.layout, NodeType::Inner);
                    let begin = node::ext_pos_begin(&self.layout, NodeType::Inner) as usize;
                    let num_items = node::read_num_items(block) as usize;
                    let item = node::read_inner_ext_item(&ext[begin..], num_items - 1);
                    block_index = item.child_block;
                }
            }
        }
    }

    /// Walks the leftmost-child chain from `block_index`, returning the leaf's `sa_left_size`
    /// (used to resolve an Inner node's "terminate descent" and RSearch boundary cases, where
    /// only the target leaf's base SA offset is needed, not its contents).
    fn leftmost_leaf_sa_left_size(&self, block_index: u32) -> u32 {
        self.descend_leftmost(block_index).1
    }

    pub fn leftmost_str_pos(&self) -> u32 {
        self.leftmost_str
    }

    pub fn rightmost_str_pos(&self) -> u32 {
        self.rightmost_str
    }

    pub fn num_sa_items(&self) -> u32 {
        self.n_items
    }

    /// Returns `(ordering, lcp)` comparing `pattern` against the suffix of `text` starting at
    /// `str_pos`, where `ordering` is `pattern`'s relation to that suffix.
    fn compare<P: SymbolSource, T: SymbolSource>(
        pattern: &P,
        text: &T,
        str_pos: u32,
    ) -> (Ordering, u32) {
        let mut lcp = 0u32;
        while (lcp as usize) < pattern.len() {
            let p = pattern.symbol_at(lcp as usize);
            let t = text.symbol_at((str_pos + lcp) as usize);
            if p != t {
                return (p.cmp(&t), lcp);
            }
            lcp += 1;
        }
        (Ordering::Equal, lcp)
    }

    /// Decodes an Inner node's `ext_pos` into the pair it lands on and whether this terminates
    /// descent (`left_str_pos` is the answer, with `child_block`'s leftmost leaf giving the SA
    /// position) or continues it (`child_block` must be searched further), by taking `ext_pos`
    /// modulo the size of an `InnerExtItem`.
    fn decode_inner_ext_pos(ext: &[u8], ext_pos_begin: u16, ext_pos: u16) -> (InnerExtItem, bool) {
        let rel = (ext_pos - ext_pos_begin) as usize;
        let item_size = node::INNER_EXT_ITEM_SIZE;
        let mut item_index = rel / item_size;
        let mut off = rel % item_size;
        if off > patricia_trie::STR_POS_SIZE as usize {
            item_index += 1;
            off = 0;
        }
        let item = node::read_inner_ext_item(ext, item_index);
        (item, off == 0)
    }

    pub fn search<P: SymbolSource, T: SymbolSource>(
        &self,
        text: &T,
        pattern: &P,
    ) -> SearchOutcome {
        if let (Ordering::Less | Ordering::Equal, lcp) =
            Self::compare(pattern, text, self.leftmost_str)
        {
            return SearchOutcome {
                str_pos: self.leftmost_str,
                sa_lo: 0,
                sa_hi: 0,
                matched_len: lcp,
            };
        }
        if let (Ordering::Greater, lcp) = Self::compare(pattern, text, self.rightmost_str) {
            return SearchOutcome {
                str_pos: self.rightmost_str,
                sa_lo: self.n_items.saturating_sub(1),
                sa_hi: self.n_items,
                matched_len: lcp,
            };
        }

        let mut block_index = self.root_block;
        let mut cur_lcp = 0u32;
        let mut hit_block: Option<u32> = None;

        let (str_pos, sa_lo) = loop {
            let block = self.block(block_index);
            let node_type = self.node_type(block_index);
            let ext_pos_begin = node::ext_pos_begin(&self.layout, node_type);
            let combined = node::combined_region(block, &self.layout, node_type);

            let result = patricia_trie::search(combined, ext_pos_begin, pattern, cur_lcp, text);
            cur_lcp = result.lcp;

            if hit_block.is_none() && cur_lcp as usize >= pattern.len() {
                hit_block = Some(block_index);
            }

            match node_type {
                NodeType::Leaf => {
                    let ext = &combined[ext_pos_begin as usize..];
                    let local_index =
                        (result.ext_pos - ext_pos_begin) as usize / node::LEAF_EXT_ITEM_SIZE;
                    let str_pos = node::read_leaf_ext_item(ext, local_index);
                    let sa_lo = node::read_sa_left_size(block) + local_index as u32;
                    break (str_pos, sa_lo);
                }
                NodeType::Inner => {
                    let ext = &combined[ext_pos_begin as usize..];
                    let (item, terminate) =
                        Self::decode_inner_ext_pos(ext, ext_pos_begin, result.ext_pos);
                    if terminate {
                        let sa_lo = self.leftmost_leaf_sa_left_size(item.child_block);
                        break (item.left_str_pos, sa_lo);
                    }
                    block_index = item.child_block;
                }
            }
        };

        let matched_len = cur_lcp;
        let sa_hi = self.compute_sa_hi(hit_block.unwrap_or(block_index), pattern, text, sa_lo);

        SearchOutcome {
            str_pos,
            sa_lo,
            sa_hi,
            matched_len,
        }
    }

    /// Resolves the exclusive upper bound of the SA range sharing the matched prefix, via
    /// `PT.RSearch` at the node where `cur_lcp` first reached `pattern.len()`.
    fn compute_sa_hi<P: SymbolSource, T: SymbolSource>(
        &self,
        hit_block: u32,
        pattern: &P,
        text: &T,
        sa_lo: u32,
    ) -> u32 {
        let block = self.block(hit_block);
        let node_type = self.node_type(hit_block);
        let ext_pos_begin = node::ext_pos_begin(&self.layout, node_type);
        let combined = node::combined_region(block, &self.layout, node_type);

        let (ext_pos, is_rightmost) =
            patricia_trie::rsearch(combined, ext_pos_begin, pattern, text);

        if is_rightmost {
            // Rightmost within this node: continue into the next sibling leaf's leftmost item,
            // when one exists, rather than treating this as globally rightmost.
            return match self.next_sibling_leaf_sa_left_size(hit_block, node_type) {
                Some(sa_left_size) => sa_left_size,
                None => self.n_items,
            };
        }

        let ext = &combined[ext_pos_begin as usize..];
        match node_type {
            NodeType::Leaf => {
                let local_index = (ext_pos - ext_pos_begin) as usize / node::LEAF_EXT_ITEM_SIZE;
                node::read_sa_left_size(block) + local_index as u32
            }
            NodeType::Inner => {
                let (item, _) = Self::decode_inner_ext_pos(ext, ext_pos_begin, ext_pos);
                self.leftmost_leaf_sa_left_size(item.child_block)
            }
        }
        .max(sa_lo)
    }

    /// Block indices are assigned in build order (leaves first, left to right, then each inner
    /// layer), so the sibling immediately to the right of a leaf is the next block index, as
    /// long as it is still a leaf. Inner nodes have no "next sibling" notion needed here, since
    /// `rsearch` at an Inner node only returns `true` when the pattern matches the node's own
    /// rightmost key, i.e. exactly at the root of a completed descent, so only a leaf can have a
    /// meaningful "next sibling leaf" here.
    fn next_sibling_leaf_sa_left_size(&self, block_index: u32, node_type: NodeType) -> Option<u32> {
        if node_type != NodeType::Leaf {
            return None;
        }
        let candidate = block_index + 1;
        if candidate as usize >= self.num_blocks {
            return None;
        }
        if self.node_type(candidate) != NodeType::Leaf {
            return None;
        }
        Some(node::read_sa_left_size(self.block(candidate)))
    }
}
