//! Node capacity derivation: how many suffixes a leaf block holds, and how many children an
//! inner block fans out to, for a given on-disk block size.
//!
//! Capacities are solved directly from measured struct sizes rather than estimated with a
//! hand-tuned offset. `NODE_HEADER_SIZE` + [`crate::patricia_trie::pt_max_size`] give an exact
//! node-size formula in terms of leaf count; [`NodeLayout::for_block_size`] just grows that
//! count until it would no longer fit and backs off by one (rounding Inner fanout down to a
//! whole number of child pairs).

use crate::patricia_trie::pt_max_size;
use crate::sbt::node::{INNER_EXT_ITEM_SIZE, LEAF_EXT_ITEM_SIZE, NODE_HEADER_SIZE};

/// Capacity and region sizes derived for one on-disk block size, for both node kinds.
#[derive(Debug, Clone, Copy)]
pub struct NodeLayout {
    pub block_size: usize,
    pub leaf_capacity: usize,
    pub leaf_pt_region_size: usize,
    pub inner_fanout: usize,
    pub inner_pt_region_size: usize,
}

impl NodeLayout {
    pub fn for_block_size(block_size: usize) -> Self {
        let leaf_capacity = max_pt_leaves(block_size, LEAF_EXT_ITEM_SIZE, 1);
        let leaf_pt_region_size = pt_max_size(leaf_capacity.max(1));

        // Inner nodes: PT covers 2 string positions (left, right) per child, so the PT-leaf
        // count must be even; `max_pt_leaves` with `items_per_str = 2` already only accepts
        // even counts as valid, by construction of its stopping condition.
        let inner_pt_leaves = max_pt_leaves(block_size, INNER_EXT_ITEM_SIZE, 2);
        let inner_fanout = inner_pt_leaves / 2;
        let inner_pt_region_size = pt_max_size(inner_pt_leaves.max(1));

        Self {
            block_size,
            leaf_capacity,
            leaf_pt_region_size,
            inner_fanout,
            inner_pt_region_size,
        }
    }

    pub fn leaf_ext_region_size(&self) -> usize {
        self.leaf_capacity * LEAF_EXT_ITEM_SIZE
    }

    pub fn inner_ext_region_size(&self) -> usize {
        self.inner_fanout * INNER_EXT_ITEM_SIZE
    }

    pub fn leaf_node_size(&self) -> usize {
        NODE_HEADER_SIZE + self.leaf_pt_region_size + self.leaf_ext_region_size()
    }

    pub fn inner_node_size(&self) -> usize {
        NODE_HEADER_SIZE + self.inner_pt_region_size + self.inner_ext_region_size()
    }
}

/// Largest `k` (a PT-leaf count, i.e. a count of individually-addressable string positions)
/// such that `NODE_HEADER_SIZE + pt_max_size(k) + (k / items_per_str) * ext_item_size <=
/// block_size`, with `k` constrained to a multiple of `items_per_str` (so that the external
/// region holds a whole number of items).
fn max_pt_leaves(block_size: usize, ext_item_size: usize, items_per_str: usize) -> usize {
    let mut k = items_per_str;
    loop {
        let next = k + items_per_str;
        let num_items = next / items_per_str;
        let size = NODE_HEADER_SIZE + pt_max_size(next.max(1)) + num_items * ext_item_size;
        if size > block_size {
            break;
        }
        k = next;
    }
    // `k` is the largest value tried that still fit; if even the smallest (one item) doesn't
    // fit, fall back to it so callers see a capacity of at least one rather than panicking here
    // (an index built with too small a block size surfaces as `CapacityExceeded` at build time).
    k
}
