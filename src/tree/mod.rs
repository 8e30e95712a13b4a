// src/tree/mod.rs

//! Annotation node trees.
//!
//! A [`Tree`] is an arena of [`Node`]s addressed by [`NodeId`] handles. Each
//! node holds a non-owning parent handle and an owning, ordered list of child
//! handles, so re-parenting and subtree removal are index rewrites.
//!
//! - [`arena`] owns the tree container and its structural mutations.
//! - [`node`] is the per-point record.
//! - [`payload`] defines the per-node data capabilities (`Radius`, `NoData`).
//! - [`traversal`] provides the stack-based pre-order and edge iterators.
//! - [`spatial`] implements nearest-node picking and radius adjustment.
//! - [`projection`] turns the tree into 3D line segments for meshing.
//! - [`outline`] computes the tapered pipe silhouette of radius edges.
//! - [`ids`] is the identity allocator used for persistent ids.
//! - [`layers`] maps layer ids to z coordinates.
//!
//! Trees are not synchronised. One writer at a time (the UI thread, or the
//! single worker thread currently operating on the tree) is assumed; readers
//! such as renderers may observe a mutation in progress.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod arena;
pub mod ids;
pub mod layers;
pub mod node;
pub mod outline;
pub mod payload;
pub mod projection;
pub mod spatial;
pub mod traversal;

pub use arena::{Tree, TreeMeta};
pub use ids::{IdAllocator, SequentialIds};
pub use layers::LayerTable;
pub use node::Node;
pub use outline::pipe_outline;
pub use payload::{NoData, Payload, Radius, ScalarPayload};
pub use projection::{Point3, ProjectionParams, Segment};
pub use traversal::{Edges, Nodes};

slotmap::new_key_type! {
    /// Handle of a node inside its owning [`Tree`].
    pub struct NodeId;
}

/// Ordinal of a z-section in the layer stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Confidence tag on the edge between a node and its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Confidence(u8);

impl Confidence {
    pub const MIN: Confidence = Confidence(0);
    pub const MAX: Confidence = Confidence(5);

    /// Values above [`Confidence::MAX`] are clamped.
    pub fn new(value: u8) -> Self {
        Confidence(value.min(Self::MAX.0))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Confidence::MAX
    }
}
