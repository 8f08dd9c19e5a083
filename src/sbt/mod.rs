//! String B-Tree: disk-resident node layout, bottom-up construction, and search.
//!
//! Split across submodules by concern: low-level node byte layout separate from the
//! higher-level structures built on top of it.

pub mod build;
pub mod layout;
pub mod node;
pub mod search;

pub use build::build;
pub use layout::NodeLayout;
pub use search::{SearchOutcome, StringBTreeFile};
