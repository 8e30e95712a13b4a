// src/tree/node.rs

use kurbo::Point;

use super::{Confidence, LayerId, NodeId};

/// One annotated point.
///
/// Coordinates are in the tree's local space; the tree transform maps them to
/// world space.
#[derive(Debug, Clone)]
pub struct Node<P> {
    pub(crate) uid: u64,
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) layer: LayerId,
    pub(crate) data: P,
    pub(crate) confidence: Confidence,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl<P> Node<P> {
    pub(crate) fn detached(uid: u64, x: f32, y: f32, layer: LayerId, data: P) -> Self {
        Self {
            uid,
            x,
            y,
            layer,
            data,
            confidence: Confidence::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Persistent identity assigned by the tree's id allocator.
    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn position(&self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.y))
    }

    pub fn layer(&self) -> LayerId {
        self.layer
    }

    pub fn data(&self) -> &P {
        &self.data
    }

    /// Confidence of the edge to the parent. Meaningless for roots.
    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
