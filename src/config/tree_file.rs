// src/config/tree_file.rs

//! Tree documents.
//!
//! ```toml
//! [tree]
//! title = "axon 12"
//! transform = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]
//! color = "#ffff00"
//!
//! [[layer]]
//! id = 1
//! z = 0.0
//!
//! [[node]]
//! id = 1
//! x = 10.0
//! y = 20.0
//! layer = 1
//! r = "2.5"
//!
//! [[node]]
//! id = 2
//! parent = 1
//! x = 30.0
//! y = 20.0
//! layer = 1
//! confidence = 3
//! ```
//!
//! Node ids are local to the file; the built tree allocates its own uids.

use std::collections::HashMap;
use std::sync::Arc;

use kurbo::Affine;
use serde::Deserialize;
use tracing::debug;

use crate::errors::{Result, Trakem2Error};
use crate::tree::arena::Rgb;
use crate::tree::{Confidence, IdAllocator, LayerId, LayerTable, NodeId, Payload, Tree, TreeMeta};

#[derive(Debug, Clone, Deserialize)]
pub struct RawTreeFile {
    pub tree: TreeHeader,

    #[serde(default, rename = "layer")]
    pub layers: Vec<LayerEntry>,

    #[serde(default, rename = "node")]
    pub nodes: Vec<NodeEntry>,
}

/// `[tree]` header.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeHeader {
    /// Persistent id; allocated on build when absent.
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default = "default_title")]
    pub title: String,
    /// Affine coefficients `[a, b, c, d, e, f]`.
    #[serde(default = "default_transform")]
    pub transform: [f64; 6],
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
}

fn default_title() -> String {
    "treeline".to_string()
}

fn default_transform() -> [f64; 6] {
    Affine::IDENTITY.as_coeffs()
}

fn default_color() -> String {
    Rgb::YELLOW.to_hex()
}

fn default_alpha() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LayerEntry {
    pub id: u64,
    pub z: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeEntry {
    pub id: u64,
    #[serde(default)]
    pub parent: Option<u64>,
    pub x: f32,
    pub y: f32,
    pub layer: u64,
    #[serde(default = "default_confidence")]
    pub confidence: u8,
    /// Payload attribute as written in XML (`r` for radius trees).
    #[serde(default)]
    pub r: Option<String>,
}

fn default_confidence() -> u8 {
    Confidence::MAX.value()
}

/// Validated tree document. Obtain through `TryFrom<RawTreeFile>`.
#[derive(Debug, Clone)]
pub struct TreeFile {
    pub(crate) header: TreeHeader,
    pub(crate) color: Rgb,
    pub(crate) layers: Vec<LayerEntry>,
    pub(crate) nodes: Vec<NodeEntry>,
}

impl TreeFile {
    pub fn new_unchecked(raw: RawTreeFile, color: Rgb) -> Self {
        Self {
            header: raw.tree,
            color,
            layers: raw.layers,
            nodes: raw.nodes,
        }
    }

    pub fn header(&self) -> &TreeHeader {
        &self.header
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn layer_table(&self) -> LayerTable {
        self.layers.iter().map(|l| (LayerId(l.id), l.z)).collect()
    }

    /// Build the tree. Edges are added with [`Tree::attach`], so any cycle in
    /// the document is reported as an invalid topology.
    pub fn build<P: Payload>(&self, ids: Arc<dyn IdAllocator>) -> Result<Tree<P>> {
        let h = &self.header;
        let meta = TreeMeta {
            id: h.id.unwrap_or_else(|| ids.next_id()),
            title: h.title.clone(),
            transform: Affine::new(h.transform),
            color: self.color,
            alpha: h.alpha,
            visible: h.visible,
            locked: h.locked,
        };
        let mut tree = Tree::with_meta(meta, ids);

        let mut handles: HashMap<u64, NodeId> = HashMap::with_capacity(self.nodes.len());
        for entry in &self.nodes {
            let data = match (P::ATTRIBUTE, entry.r.as_deref()) {
                (Some(_), Some(value)) => P::parse_attribute(value)?,
                _ => P::default(),
            };
            let id = tree.create_node(entry.x, entry.y, LayerId(entry.layer), data);
            handles.insert(entry.id, id);
        }

        let lookup = |id: u64| {
            handles
                .get(&id)
                .copied()
                .ok_or_else(|| Trakem2Error::ConfigError(format!("unknown node id {id}")))
        };
        for entry in &self.nodes {
            let child = lookup(entry.id)?;
            match entry.parent {
                None => tree.set_root(child)?,
                Some(parent) => tree.attach(lookup(parent)?, child, Confidence::new(entry.confidence))?,
            }
        }

        debug!(tree = tree.id(), nodes = tree.len(), "tree built from document");
        Ok(tree)
    }
}
