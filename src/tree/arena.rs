// src/tree/arena.rs

//! The tree container and its structural mutations.
//!
//! Structural operations either succeed completely or leave the tree
//! untouched: every check runs before the first write.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use kurbo::Affine;
use slotmap::SlotMap;
use tracing::{debug, error};

use super::ids::IdAllocator;
use super::node::Node;
use super::payload::Payload;
use super::{Confidence, LayerId, NodeId};
use crate::errors::{Result, Trakem2Error};

/// RGB color of a tree, as used by renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const YELLOW: Rgb = Rgb(255, 255, 0);

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("invalid color: {s} (expected \"#rrggbb\")"));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|e| format!("invalid color: {s} ({e})"))
        };
        Ok(Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Identity and display state of a tree. Rendering consumes it; the tree
/// itself only carries it along (and uses `transform` for picking).
#[derive(Debug, Clone, PartialEq)]
pub struct TreeMeta {
    pub id: u64,
    pub title: String,
    /// Maps local node coordinates to world coordinates.
    pub transform: Affine,
    pub color: Rgb,
    pub alpha: f32,
    pub visible: bool,
    pub locked: bool,
}

impl TreeMeta {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            transform: Affine::IDENTITY,
            color: Rgb::YELLOW,
            alpha: 1.0,
            visible: true,
            locked: false,
        }
    }
}

/// Rooted tree of annotation nodes stored in an arena.
///
/// Nodes created with [`Tree::create_node`] start out detached: they live in
/// the arena but take no part in traversal until attached below the root (or
/// installed as the root).
#[derive(Debug)]
pub struct Tree<P: Payload> {
    meta: TreeMeta,
    nodes: SlotMap<NodeId, Node<P>>,
    root: Option<NodeId>,
    ids: Arc<dyn IdAllocator>,
}

impl<P: Payload> Tree<P> {
    /// Create an empty tree with a freshly allocated id.
    pub fn new(title: impl Into<String>, ids: Arc<dyn IdAllocator>) -> Self {
        let meta = TreeMeta::new(ids.next_id(), title);
        Self::with_meta(meta, ids)
    }

    pub fn with_meta(meta: TreeMeta, ids: Arc<dyn IdAllocator>) -> Self {
        Self {
            meta,
            nodes: SlotMap::with_key(),
            root: None,
            ids,
        }
    }

    pub fn meta(&self) -> &TreeMeta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut TreeMeta {
        &mut self.meta
    }

    pub fn id(&self) -> u64 {
        self.meta.id
    }

    pub fn transform(&self) -> Affine {
        self.meta.transform
    }

    pub fn set_transform(&mut self, transform: Affine) {
        self.meta.transform = transform;
    }

    pub fn id_allocator(&self) -> &Arc<dyn IdAllocator> {
        &self.ids
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of nodes in the arena, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<P>> {
        self.nodes.get(id)
    }

    /// Like [`Tree::node`] but reports a missing handle as an error.
    pub fn get(&self, id: NodeId) -> Result<&Node<P>> {
        self.nodes.get(id).ok_or(Trakem2Error::NodeNotFound(id))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Allocate a detached node.
    pub fn create_node(&mut self, x: f32, y: f32, layer: LayerId, data: P) -> NodeId {
        let uid = self.ids.next_id();
        self.nodes.insert(Node::detached(uid, x, y, layer, data))
    }

    /// Install a detached node as the root of an empty tree.
    pub fn set_root(&mut self, id: NodeId) -> Result<()> {
        let node = self.get(id)?;
        if let Some(existing) = self.root {
            if existing == id {
                return Ok(());
            }
            return Err(Trakem2Error::InvalidTopology(format!(
                "tree {} already has root {:?}",
                self.meta.id, existing
            )));
        }
        if node.parent.is_some() {
            return Err(Trakem2Error::InvalidTopology(format!(
                "node {id:?} has a parent and cannot become the root"
            )));
        }
        self.root = Some(id);
        Ok(())
    }

    /// Append `child` to `parent`'s children.
    ///
    /// Rejected with [`Trakem2Error::InvalidTopology`] when `child` already
    /// hangs from another node, is the root, or is an ancestor of `parent`.
    /// Attaching a child to the parent it already has is a no-op.
    pub fn attach(&mut self, parent: NodeId, child: NodeId, confidence: Confidence) -> Result<()> {
        self.get(parent)?;
        let current = self.get(child)?.parent;

        if parent == child {
            return Err(Trakem2Error::InvalidTopology(format!(
                "node {child:?} cannot be attached to itself"
            )));
        }
        match current {
            Some(p) if p == parent => {
                debug!(?parent, ?child, "attach: child already under this parent");
                return Ok(());
            }
            Some(p) => {
                return Err(Trakem2Error::InvalidTopology(format!(
                    "node {child:?} already has parent {p:?}"
                )));
            }
            None => {}
        }
        if self.root == Some(child) {
            return Err(Trakem2Error::InvalidTopology(format!(
                "root {child:?} cannot be attached below another node"
            )));
        }
        if self.is_ancestor(child, parent) {
            return Err(Trakem2Error::InvalidTopology(format!(
                "attaching {child:?} under {parent:?} would create a cycle"
            )));
        }

        self.link(parent, child, confidence);
        Ok(())
    }

    /// Remove `id` and its whole subtree, returning it as an independent tree
    /// rooted at the detached node. Node uids are preserved; handles are not.
    pub fn detach(&mut self, id: NodeId) -> Result<Tree<P>> {
        let parent = self.get(id)?.parent;
        let subtree = self.subtree_ids(id)?;

        if let Some(p) = parent {
            let position = self
                .nodes
                .get(p)
                .and_then(|pn| pn.children.iter().position(|c| *c == id));
            let Some(position) = position else {
                error!(node = ?id, parent = ?p, "node missing from its parent's children");
                return Err(Trakem2Error::InconsistentState(format!(
                    "node {id:?} claims parent {p:?} but is not among its children"
                )));
            };
            if let Some(pn) = self.nodes.get_mut(p) {
                pn.children.remove(position);
            }
        } else if self.root == Some(id) {
            self.root = None;
        }

        let meta = TreeMeta {
            id: self.ids.next_id(),
            ..self.meta.clone()
        };
        let mut out = Tree::with_meta(meta, Arc::clone(&self.ids));

        // (old handle, new parent handle); children pushed in reverse so
        // siblings keep their order.
        let mut stack: Vec<(NodeId, Option<NodeId>)> = vec![(id, None)];
        while let Some((old, new_parent)) = stack.pop() {
            let Some(mut node) = self.nodes.remove(old) else {
                continue;
            };
            let children = std::mem::take(&mut node.children);
            node.parent = new_parent;
            let new_id = out.nodes.insert(node);
            match new_parent {
                Some(np) => {
                    if let Some(pn) = out.nodes.get_mut(np) {
                        pn.children.push(new_id);
                    }
                }
                None => out.root = Some(new_id),
            }
            stack.extend(children.into_iter().rev().map(|c| (c, Some(new_id))));
        }

        debug!(
            tree = self.meta.id,
            detached = out.meta.id,
            nodes = subtree.len(),
            "detached subtree"
        );
        Ok(out)
    }

    /// Replace a node's payload.
    pub fn set_payload(&mut self, id: NodeId, data: P) -> Result<()> {
        let node = self.nodes.get_mut(id).ok_or(Trakem2Error::NodeNotFound(id))?;
        node.data = data;
        Ok(())
    }

    pub fn payload_mut(&mut self, id: NodeId) -> Option<&mut P> {
        self.nodes.get_mut(id).map(|n| &mut n.data)
    }

    pub fn set_confidence(&mut self, id: NodeId, confidence: Confidence) -> Result<()> {
        let node = self.nodes.get_mut(id).ok_or(Trakem2Error::NodeNotFound(id))?;
        node.confidence = confidence;
        Ok(())
    }

    /// Move a node within its layer.
    pub fn set_position(&mut self, id: NodeId, x: f32, y: f32) -> Result<()> {
        let node = self.nodes.get_mut(id).ok_or(Trakem2Error::NodeNotFound(id))?;
        node.x = x;
        node.y = y;
        Ok(())
    }

    /// True when `ancestor` lies on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Number of edges between `id` and the top of its (sub)tree.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(p) = current {
            depth += 1;
            current = self.parent(p);
        }
        depth
    }

    /// Deep copy of the rooted structure with fresh node uids.
    ///
    /// With `copy_id` the copy keeps this tree's id; otherwise a new one is
    /// allocated. Detached nodes are not copied.
    pub fn clone_tree(&self, copy_id: bool) -> Tree<P> {
        let id = if copy_id { self.meta.id } else { self.ids.next_id() };
        let meta = TreeMeta {
            id,
            ..self.meta.clone()
        };
        let mut out = Tree::with_meta(meta, Arc::clone(&self.ids));

        let Some(root) = self.root else {
            return out;
        };
        let mut stack: Vec<(NodeId, Option<NodeId>)> = vec![(root, None)];
        while let Some((old, new_parent)) = stack.pop() {
            let Some(src) = self.nodes.get(old) else {
                continue;
            };
            let new_id = out.create_node(src.x, src.y, src.layer, src.data.clone());
            match new_parent {
                Some(np) => out.link(np, new_id, src.confidence),
                None => out.root = Some(new_id),
            }
            stack.extend(src.children.iter().rev().map(|c| (*c, Some(new_id))));
        }
        out
    }

    /// Audit every structural invariant: a single parentless root, mutual
    /// parent/child links, and no node reachable twice.
    pub fn check_invariants(&self) -> Result<()> {
        for (id, node) in self.nodes.iter() {
            if let Some(p) = node.parent {
                let listed = self
                    .nodes
                    .get(p)
                    .map(|pn| pn.children.iter().filter(|c| **c == id).count())
                    .unwrap_or(0);
                if listed != 1 {
                    return Err(Trakem2Error::InconsistentState(format!(
                        "node {id:?} listed {listed} times by parent {p:?}"
                    )));
                }
            }
            for child in &node.children {
                if self.parent(*child) != Some(id) {
                    return Err(Trakem2Error::InconsistentState(format!(
                        "child {child:?} of {id:?} points elsewhere"
                    )));
                }
            }
        }
        if let Some(root) = self.root {
            if self.parent(root).is_some() {
                return Err(Trakem2Error::InconsistentState(format!(
                    "root {root:?} has a parent"
                )));
            }
            self.subtree_ids(root)?;
        }
        Ok(())
    }

    /// Handles of `id` and all its descendants, verifying each exists and is
    /// reached once.
    fn subtree_ids(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.nodes.get(current).ok_or_else(|| {
                Trakem2Error::InconsistentState(format!("dangling child handle {current:?}"))
            })?;
            if !seen.insert(current) {
                return Err(Trakem2Error::InconsistentState(format!(
                    "node {current:?} reachable more than once"
                )));
            }
            out.push(current);
            stack.extend(node.children.iter().copied());
        }
        Ok(out)
    }

    fn link(&mut self, parent: NodeId, child: NodeId, confidence: Confidence) {
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
            c.confidence = confidence;
        }
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        }
    }
}
