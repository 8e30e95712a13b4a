// src/tree/traversal.rs

//! Stack-based traversals.
//!
//! Nothing here recurses, so long unbranched chains (tens of thousands of
//! nodes) are walked in constant call-stack depth.

use super::arena::Tree;
use super::node::Node;
use super::payload::Payload;
use super::NodeId;

/// Pre-order iterator over the nodes reachable from a start node.
///
/// Children are visited in insertion order. The iterator is cheap to clone,
/// and calling [`Tree::nodes`] again restarts the walk.
#[derive(Debug, Clone)]
pub struct Nodes<'a, P: Payload> {
    tree: &'a Tree<P>,
    stack: Vec<NodeId>,
}

impl<'a, P: Payload> Iterator for Nodes<'a, P> {
    type Item = (NodeId, &'a Node<P>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = self.stack.pop()?;
            // Dangling handles are skipped; `check_invariants` reports them.
            if let Some(node) = self.tree.node(id) {
                self.stack.extend(node.children().iter().rev().copied());
                return Some((id, node));
            }
        }
    }
}

/// Iterator over `(parent, child)` handle pairs, one per edge, in the
/// pre-order of the child.
#[derive(Debug, Clone)]
pub struct Edges<'a, P: Payload> {
    inner: Nodes<'a, P>,
}

impl<'a, P: Payload> Iterator for Edges<'a, P> {
    type Item = (NodeId, NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        for (id, node) in self.inner.by_ref() {
            if let Some(parent) = node.parent() {
                return Some((parent, id));
            }
        }
        None
    }
}

impl<P: Payload> Tree<P> {
    /// All nodes of the rooted tree, pre-order. Empty when there is no root.
    pub fn nodes(&self) -> Nodes<'_, P> {
        Nodes {
            tree: self,
            stack: self.root().into_iter().collect(),
        }
    }

    /// Pre-order walk of the subtree rooted at `start`.
    pub fn subtree(&self, start: NodeId) -> Nodes<'_, P> {
        let stack = if self.contains(start) { vec![start] } else { Vec::new() };
        Nodes { tree: self, stack }
    }

    /// Node handles of the rooted tree, pre-order, collected into a list.
    pub fn collect_all(&self) -> Vec<NodeId> {
        self.nodes().map(|(id, _)| id).collect()
    }

    /// Every parent/child edge of the rooted tree.
    pub fn edges(&self) -> Edges<'_, P> {
        Edges {
            inner: self.nodes(),
        }
    }

    /// Nodes without children.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes().filter(|(_, n)| n.is_leaf()).map(|(id, _)| id)
    }
}
