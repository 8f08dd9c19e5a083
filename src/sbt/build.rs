//! Bottom-up String B-Tree construction: leaves first, then successive inner layers until one
//! root block remains. Each layer is split into blocks via [`chunk_sizes`], which pushes any
//! remainder items into the later chunks rather than leaving a short final one.

use std::path::Path;

use crate::error::Result;
use crate::mmap::WriteMapping;
use crate::packed::PackedSymbolView;
use crate::patricia_trie::NaivePatriciaTrie;
use crate::sbt::layout::NodeLayout;
use crate::sbt::node::{
    self, InnerExtItem, NodeType, ext_pos_begin, write_num_items, write_sa_left_size, write_type,
};

/// Splits `n` items into consecutive chunks of `capacity` or `capacity + 1`, with the larger
/// chunks placed last, so no chunk falls below `capacity - 1` items.
fn chunk_sizes(n: usize, capacity: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let num_nodes = n.div_ceil(capacity);
    let floor = n / num_nodes;
    let remainder = n % num_nodes;
    let num_floor = num_nodes - remainder;
    let mut sizes = vec![floor; num_floor];
    sizes.extend(std::iter::repeat_n(floor + 1, remainder));
    sizes
}

/// One already-built node's summary, carried up into the next layer.
struct NodeSummary {
    left_str_pos: u32,
    right_str_pos: u32,
    block_index: u32,
}

/// Builds a leaf block from a slice of `(str_pos)` values (already in SA order), returning its
/// bytes and a [`NodeSummary`].
fn build_leaf_block(
    text: PackedSymbolView<'_>,
    layout: &NodeLayout,
    str_positions: &[u32],
    sa_left_size: u32,
    block_index: u32,
) -> Result<(Vec<u8>, NodeSummary)> {
    let mut block = vec![0u8; layout.block_size];
    write_type(&mut block, NodeType::Leaf);
    write_sa_left_size(&mut block, sa_left_size);
    write_num_items(&mut block, str_positions.len() as u16);

    let ext_begin = ext_pos_begin(layout, NodeType::Leaf);
    let mut trie = NaivePatriciaTrie::new();
    for (i, &str_pos) in str_positions.iter().enumerate() {
        let ext_pos = ext_begin + (i * node::LEAF_EXT_ITEM_SIZE) as u16;
        trie.insert(&text, str_pos, ext_pos);
    }

    {
        let pt_bytes = node::pt_region_mut(&mut block, layout, NodeType::Leaf);
        trie.serialize(pt_bytes)?;
    }

    let ext_start = node::NODE_HEADER_SIZE + layout.leaf_pt_region_size;
    let ext_end = ext_start + layout.leaf_ext_region_size();
    let ext = &mut block[ext_start..ext_end];
    for (i, &str_pos) in str_positions.iter().enumerate() {
        node::write_leaf_ext_item(ext, i, str_pos);
    }

    let summary = NodeSummary {
        left_str_pos: str_positions[0],
        right_str_pos: *str_positions.last().unwrap(),
        block_index,
    };
    Ok((block, summary))
}

/// Builds one inner block from a slice of child summaries, returning its bytes and its own
/// [`NodeSummary`] for the next layer up.
fn build_inner_block(
    text: PackedSymbolView<'_>,
    layout: &NodeLayout,
    children: &[NodeSummary],
    block_index: u32,
) -> Result<(Vec<u8>, NodeSummary)> {
    let mut block = vec![0u8; layout.block_size];
    write_type(&mut block, NodeType::Inner);
    write_sa_left_size(&mut block, 0);
    write_num_items(&mut block, children.len() as u16);

    let ext_begin = ext_pos_begin(layout, NodeType::Inner);
    let mut trie = NaivePatriciaTrie::new();
    for (i, child) in children.iter().enumerate() {
        let base = ext_begin + (i * node::INNER_EXT_ITEM_SIZE) as u16;
        trie.insert(&text, child.left_str_pos, base);
        trie.insert(&text, child.right_str_pos, base + 4);
    }

    {
        let pt_bytes = node::pt_region_mut(&mut block, layout, NodeType::Inner);
        trie.serialize(pt_bytes)?;
    }

    let ext_start = node::NODE_HEADER_SIZE + layout.inner_pt_region_size;
    let ext_end = ext_start + layout.inner_ext_region_size();
    let ext = &mut block[ext_start..ext_end];
    for (i, child) in children.iter().enumerate() {
        node::write_inner_ext_item(
            ext,
            i,
            &InnerExtItem {
                left_str_pos: child.left_str_pos,
                right_str_pos: child.right_str_pos,
                child_block: child.block_index,
            },
        );
    }

    let summary = NodeSummary {
        left_str_pos: children[0].left_str_pos,
        right_str_pos: children.last().unwrap().right_str_pos,
        block_index,
    };
    Ok((block, summary))
}

/// Builds a complete `*.sbt` file from a compressed text and an already-sorted suffix array.
///
/// `sa` holds super-symbol indices; each is multiplied by `d` to recover the raw symbol-buffer
/// `str_pos` the SBT (and, downstream, the wavelet tree) actually indexes.
pub fn build(
    path: impl AsRef<Path>,
    text: PackedSymbolView<'_>,
    sa: &[u32],
    d: usize,
    sbt_block_bytes: usize,
) -> Result<()> {
    let layout = NodeLayout::for_block_size(sbt_block_bytes);
    let str_positions: Vec<u32> = sa.iter().map(|&pos| pos * d as u32).collect();

    let mut blocks: Vec<Vec<u8>> = Vec::new();

    let mut layer: Vec<NodeSummary> = Vec::new();
    if !str_positions.is_empty() {
        let mut cumulative = 0usize;
        for size in chunk_sizes(str_positions.len(), layout.leaf_capacity) {
            let block_index = blocks.len() as u32;
            let (block, summary) = build_leaf_block(
                text,
                &layout,
                &str_positions[cumulative..cumulative + size],
                cumulative as u32,
                block_index,
            )?;
            blocks.push(block);
            layer.push(summary);
            cumulative += size;
        }
    }

    while layer.len() > 1 {
        let mut next_layer = Vec::new();
        let mut cumulative = 0usize;
        for size in chunk_sizes(layer.len(), layout.inner_fanout) {
            let block_index = blocks.len() as u32;
            let (block, summary) = build_inner_block(
                text,
                &layout,
                &layer[cumulative..cumulative + size],
                block_index,
            )?;
            blocks.push(block);
            next_layer.push(summary);
            cumulative += size;
        }
        layer = next_layer;
    }

    let total_bytes = blocks.len() * layout.block_size;
    let mut mapping = WriteMapping::create(path, total_bytes.max(layout.block_size))?;
    let bytes = mapping.as_bytes_mut();
    for (i, block) in blocks.iter().enumerate() {
        bytes[i * layout.block_size..(i + 1) * layout.block_size].copy_from_slice(block);
    }
    mapping.flush()
}
