//! Tree fixtures.

use std::sync::Arc;

use trakem2_core::tree::{
    Confidence, IdAllocator, LayerId, NodeId, Payload, Radius, SequentialIds, Tree,
};

pub const LAYER: LayerId = LayerId(1);

pub fn ids() -> Arc<dyn IdAllocator> {
    Arc::new(SequentialIds::default())
}

/// z of a layer in fixtures: twice its ordinal.
pub fn layer_z(layer: LayerId) -> f64 {
    layer.0 as f64 * 2.0
}

/// Incremental tree construction by index.
pub struct TreeBuilder<P: Payload> {
    tree: Tree<P>,
    handles: Vec<NodeId>,
}

impl<P: Payload> TreeBuilder<P> {
    /// Start with a root at `(x, y)` on [`LAYER`].
    pub fn new(x: f32, y: f32, data: P) -> Self {
        let mut tree = Tree::new("fixture", ids());
        let root = tree.create_node(x, y, LAYER, data);
        tree.set_root(root).expect("fresh tree accepts a root");
        Self {
            tree,
            handles: vec![root],
        }
    }

    /// Add a node under the node created `parent`-th (0 is the root).
    pub fn child(mut self, parent: usize, x: f32, y: f32, layer: LayerId, data: P) -> Self {
        self.push(parent, x, y, layer, data);
        self
    }

    fn push(&mut self, parent: usize, x: f32, y: f32, layer: LayerId, data: P) -> NodeId {
        let id = self.tree.create_node(x, y, layer, data);
        self.tree
            .attach(self.handles[parent], id, Confidence::MAX)
            .expect("builder only attaches fresh nodes");
        self.handles.push(id);
        id
    }

    pub fn handle(&self, index: usize) -> NodeId {
        self.handles[index]
    }

    pub fn build(self) -> Tree<P> {
        self.tree
    }

    pub fn build_with_handles(self) -> (Tree<P>, Vec<NodeId>) {
        (self.tree, self.handles)
    }
}

/// `n` nodes in a straight line along x, each a child of the previous one,
/// layers cycling through 1..=3.
pub fn chain(n: usize) -> Tree<Radius> {
    assert!(n > 0);
    let mut b = TreeBuilder::new(0.0, 0.0, Radius(1.0));
    for i in 1..n {
        let layer = LayerId(1 + (i % 3) as u64);
        b.push(i - 1, i as f32, 0.0, layer, Radius(1.0));
    }
    b.build()
}

/// A root with `k` children spread on a circle.
pub fn star(k: usize) -> Tree<Radius> {
    let mut b = TreeBuilder::new(0.0, 0.0, Radius(2.0));
    for i in 0..k {
        let angle = i as f32 / k.max(1) as f32 * std::f32::consts::TAU;
        b.push(0, 50.0 * angle.cos(), 50.0 * angle.sin(), LAYER, Radius(1.0));
    }
    b.build()
}

/// Tree shaped by `picks`: node `i + 1` hangs from node `picks[i] % (i + 1)`.
/// Positions and layers derive from the index so projections differ.
pub fn random_tree(picks: &[usize]) -> (Tree<Radius>, Vec<NodeId>) {
    let mut b = TreeBuilder::new(0.0, 0.0, Radius(1.0));
    for (i, pick) in picks.iter().enumerate() {
        let parent = pick % (i + 1);
        let n = (i + 1) as f32;
        b.push(parent, n * 3.0, (n * 7.0) % 11.0, LayerId(1 + (i % 4) as u64), Radius(n));
    }
    b.build_with_handles()
}
