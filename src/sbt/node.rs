//! Byte-level layout of one SBT block: header, PT region, External region.
//!
//! Every accessor here takes explicit byte offsets and reads/writes little-endian integers
//! directly — no `#[repr(packed)]` struct is referenced through a pointer, per the "misaligned
//! loads" design note. The `type` tag sits at offset 0 and `sa_left_size` at offset 1; this
//! implementation reserves two further bytes for an explicit `num_items` count (offset 5) before
//! the PT region starts, since node capacity is a runtime [`super::layout::NodeLayout`] value and
//! the last node of a layer is typically smaller than capacity — a stored count is simpler and
//! cheaper than re-deriving it by walking the node's PT counting external branches (documented in
//! `DESIGN.md`).

use crate::sbt::layout::NodeLayout;

/// Header size: 1-byte type tag + `u32 sa_left_size` + `u16 num_items`.
pub const NODE_HEADER_SIZE: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Inner = 0,
    Leaf = 1,
}

impl NodeType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(NodeType::Inner),
            1 => Some(NodeType::Leaf),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

pub fn read_type(block: &[u8]) -> Option<NodeType> {
    NodeType::from_tag(block[0])
}

pub fn write_type(block: &mut [u8], node_type: NodeType) {
    block[0] = node_type.tag();
}

pub fn read_sa_left_size(block: &[u8]) -> u32 {
    u32::from_le_bytes(block[1..5].try_into().unwrap())
}

pub fn write_sa_left_size(block: &mut [u8], value: u32) {
    block[1..5].copy_from_slice(&value.to_le_bytes());
}

pub fn read_num_items(block: &[u8]) -> u16 {
    u16::from_le_bytes(block[5..7].try_into().unwrap())
}

pub fn write_num_items(block: &mut [u8], value: u16) {
    block[5..7].copy_from_slice(&value.to_le_bytes());
}

fn pt_region_size(layout: &NodeLayout, node_type: NodeType) -> usize {
    match node_type {
        NodeType::Leaf => layout.leaf_pt_region_size,
        NodeType::Inner => layout.inner_pt_region_size,
    }
}

fn ext_region_size(layout: &NodeLayout, node_type: NodeType) -> usize {
    match node_type {
        NodeType::Leaf => layout.leaf_ext_region_size(),
        NodeType::Inner => layout.inner_ext_region_size(),
    }
}

/// The PT region concatenated with the External region, exactly the addressing space
/// [`crate::patricia_trie::search`]/[`crate::patricia_trie::rsearch`] expect. `ext_pos_begin`
/// (the PT region's reserved size) is the threshold separating the two halves.
pub fn combined_region(block: &[u8], layout: &NodeLayout, node_type: NodeType) -> &[u8] {
    let size = pt_region_size(layout, node_type) + ext_region_size(layout, node_type);
    &block[NODE_HEADER_SIZE..NODE_HEADER_SIZE + size]
}

pub fn combined_region_mut<'a>(
    block: &'a mut [u8],
    layout: &NodeLayout,
    node_type: NodeType,
) -> &'a mut [u8] {
    let size = pt_region_size(layout, node_type) + ext_region_size(layout, node_type);
    &mut block[NODE_HEADER_SIZE..NODE_HEADER_SIZE + size]
}

pub fn pt_region_mut<'a>(block: &'a mut [u8], layout: &NodeLayout, node_type: NodeType) -> &'a mut [u8] {
    let size = pt_region_size(layout, node_type);
    &mut block[NODE_HEADER_SIZE..NODE_HEADER_SIZE + size]
}

pub fn ext_pos_begin(layout: &NodeLayout, node_type: NodeType) -> u16 {
    pt_region_size(layout, node_type) as u16
}

/// Bytes of one `LeafExtItem`: `u32 str_pos`.
pub const LEAF_EXT_ITEM_SIZE: usize = 4;
/// Bytes of one `InnerExtItem`: `u32 left_str_pos, u32 right_str_pos, u32 child_block`.
pub const INNER_EXT_ITEM_SIZE: usize = 12;

pub fn read_leaf_ext_item(ext: &[u8], index: usize) -> u32 {
    let at = index * LEAF_EXT_ITEM_SIZE;
    u32::from_le_bytes(ext[at..at + 4].try_into().unwrap())
}

pub fn write_leaf_ext_item(ext: &mut [u8], index: usize, str_pos: u32) {
    let at = index * LEAF_EXT_ITEM_SIZE;
    ext[at..at + 4].copy_from_slice(&str_pos.to_le_bytes());
}

pub struct InnerExtItem {
    pub left_str_pos: u32,
    pub right_str_pos: u32,
    pub child_block: u32,
}

pub fn read_inner_ext_item(ext: &[u8], index: usize) -> InnerExtItem {
    let at = index * INNER_EXT_ITEM_SIZE;
    InnerExtItem {
        left_str_pos: u32::from_le_bytes(ext[at..at + 4].try_into().unwrap()),
        right_str_pos: u32::from_le_bytes(ext[at + 4..at + 8].try_into().unwrap()),
        child_block: u32::from_le_bytes(ext[at + 8..at + 12].try_into().unwrap()),
    }
}

pub fn write_inner_ext_item(ext: &mut [u8], index: usize, item: &InnerExtItem) {
    let at = index * INNER_EXT_ITEM_SIZE;
    ext[at..at + 4].copy_from_slice(&item.left_str_pos.to_le_bytes());
    ext[at + 4..at + 8].copy_from_slice(&item.right_str_pos.to_le_bytes());
    ext[at + 8..at + 12].copy_from_slice(&item.child_block.to_le_bytes());
}
