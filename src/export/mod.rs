// src/export/mod.rs

//! Structural export of trees for the owning document's persistence layer.
//!
//! - [`xml`] writes `<t2_treeline>` elements with nested `<t2_node>`
//!   children and rebuilds node records from parsed attribute maps.

pub mod xml;

pub use xml::{node_from_attributes, write_tree, NodeRecord};
