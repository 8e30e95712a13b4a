// src/tree/spatial.rs

//! Nearest-node picking.

use kurbo::Point;
use tracing::{debug, trace};

use super::arena::Tree;
use super::payload::{Payload, ScalarPayload};
use super::{LayerId, NodeId};

/// Screen-space pick tolerance used when none is configured, in pixels.
pub const DEFAULT_PICK_RADIUS_PX: f64 = 10.0;

/// Resolution-aware nearest-node picking.
///
/// A node is eligible when its distance to the query point is at most
/// `radius_px / magnification`, i.e. a fixed on-screen tolerance expressed in
/// model units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Picker {
    pub radius_px: f64,
}

impl Default for Picker {
    fn default() -> Self {
        Self {
            radius_px: DEFAULT_PICK_RADIUS_PX,
        }
    }
}

impl Picker {
    pub fn new(radius_px: f64) -> Self {
        Self { radius_px }
    }

    /// Model-space tolerance at `magnification`, or `None` when the
    /// magnification is unusable.
    pub fn tolerance(&self, magnification: f64) -> Option<f64> {
        if !magnification.is_finite() || magnification <= 0.0 {
            return None;
        }
        Some(self.radius_px / magnification)
    }

    /// Nearest node on `layer` to the local point `(x, y)`.
    ///
    /// The point must already be in the tree's local space. Ties go to the
    /// node met first in pre-order.
    pub fn find_nearest<P: Payload>(
        &self,
        tree: &Tree<P>,
        x: f64,
        y: f64,
        layer: LayerId,
        magnification: f64,
    ) -> Option<NodeId> {
        let Some(tolerance) = self.tolerance(magnification) else {
            debug!(magnification, "find_nearest: unusable magnification");
            return None;
        };
        let query = Point::new(x, y);

        let mut best: Option<(NodeId, f64)> = None;
        for (id, node) in tree.nodes() {
            if node.layer() != layer {
                continue;
            }
            let d = node.position().distance(query);
            if d > tolerance {
                continue;
            }
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((id, d));
            }
        }
        trace!(?best, tolerance, "find_nearest");
        best.map(|(id, _)| id)
    }

    /// Like [`Picker::find_nearest`] but takes a world-space point and maps
    /// it through the inverse tree transform.
    pub fn find_nearest_world<P: Payload>(
        &self,
        tree: &Tree<P>,
        world: Point,
        layer: LayerId,
        magnification: f64,
    ) -> Option<NodeId> {
        let local = to_local(tree, world)?;
        self.find_nearest(tree, local.x, local.y, layer, magnification)
    }

    /// Add `delta` to the payload of the node nearest to the world point
    /// `(x, y)`. Returns the adjusted node, if any.
    pub fn adjust_payload<P: ScalarPayload>(
        &self,
        tree: &mut Tree<P>,
        delta: f32,
        x: f64,
        y: f64,
        layer: LayerId,
        magnification: f64,
    ) -> Option<NodeId> {
        let nearest = self.find_nearest_world(tree, Point::new(x, y), layer, magnification)?;
        let data = tree.payload_mut(nearest)?;
        data.adjust(delta);
        debug!(node = ?nearest, delta, value = data.scalar(), "adjusted node payload");
        Some(nearest)
    }
}

fn to_local<P: Payload>(tree: &Tree<P>, world: Point) -> Option<Point> {
    let transform = tree.transform();
    if transform == kurbo::Affine::IDENTITY {
        return Some(world);
    }
    if transform.determinant() == 0.0 {
        debug!(tree = tree.id(), "tree transform is not invertible");
        return None;
    }
    Some(transform.inverse() * world)
}

impl<P: Payload> Tree<P> {
    /// Nearest node using the default pick tolerance. See [`Picker`].
    pub fn find_nearest(&self, x: f64, y: f64, layer: LayerId, magnification: f64) -> Option<NodeId> {
        Picker::default().find_nearest(self, x, y, layer, magnification)
    }
}

impl<P: ScalarPayload> Tree<P> {
    /// Nudge the payload of the node nearest to a world point, using the
    /// default pick tolerance. See [`Picker::adjust_payload`].
    pub fn adjust_payload(
        &mut self,
        delta: f32,
        x: f64,
        y: f64,
        layer: LayerId,
        magnification: f64,
    ) -> Option<NodeId> {
        Picker::default().adjust_payload(self, delta, x, y, layer, magnification)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kurbo::{Affine, Vec2};

    use super::*;
    use crate::tree::{Confidence, Radius, SequentialIds};

    fn single(x: f32, y: f32) -> (Tree<Radius>, NodeId) {
        let mut t = Tree::new("pick", Arc::new(SequentialIds::default()));
        let n = t.create_node(x, y, LayerId(1), Radius(2.0));
        t.set_root(n).unwrap();
        (t, n)
    }

    #[test]
    fn empty_tree_finds_nothing() {
        let t: Tree<Radius> = Tree::new("empty", Arc::new(SequentialIds::default()));
        assert_eq!(t.find_nearest(0.0, 0.0, LayerId(1), 1.0), None);
    }

    #[test]
    fn tolerance_scales_inversely_with_magnification() {
        let (t, n) = single(0.0, 0.0);
        // 10 px at 1x is 10 model units; at 4x it is 2.5.
        assert_eq!(t.find_nearest(8.0, 0.0, LayerId(1), 1.0), Some(n));
        assert_eq!(t.find_nearest(8.0, 0.0, LayerId(1), 4.0), None);
        assert_eq!(t.find_nearest(2.0, 0.0, LayerId(1), 4.0), Some(n));
        assert_eq!(t.find_nearest(30.0, 0.0, LayerId(1), 0.5), None);
        assert_eq!(t.find_nearest(19.0, 0.0, LayerId(1), 0.5), Some(n));
    }

    #[test]
    fn other_layers_are_ignored() {
        let (t, _) = single(0.0, 0.0);
        assert_eq!(t.find_nearest(0.0, 0.0, LayerId(2), 1.0), None);
    }

    #[test]
    fn bad_magnification_finds_nothing() {
        let (t, _) = single(0.0, 0.0);
        assert_eq!(t.find_nearest(0.0, 0.0, LayerId(1), 0.0), None);
        assert_eq!(t.find_nearest(0.0, 0.0, LayerId(1), f64::NAN), None);
    }

    #[test]
    fn ties_go_to_first_in_pre_order() {
        let (mut t, root) = single(0.0, 0.0);
        let left = t.create_node(-2.0, 0.0, LayerId(1), Radius(0.0));
        let right = t.create_node(2.0, 0.0, LayerId(1), Radius(0.0));
        t.attach(root, left, Confidence::MAX).unwrap();
        t.attach(root, right, Confidence::MAX).unwrap();
        t.set_position(root, 0.0, 50.0).unwrap();

        for _ in 0..3 {
            assert_eq!(t.find_nearest(0.0, 0.0, LayerId(1), 1.0), Some(left));
        }
    }

    #[test]
    fn adjust_applies_inverse_transform() {
        let (mut t, n) = single(0.0, 0.0);
        t.set_transform(Affine::translate(Vec2::new(100.0, 50.0)));

        assert_eq!(t.adjust_payload(1.5, 0.0, 0.0, LayerId(1), 1.0), None);
        assert_eq!(t.adjust_payload(1.5, 101.0, 50.0, LayerId(1), 1.0), Some(n));
        assert_eq!(t.get(n).unwrap().data(), &Radius(3.5));
    }
}
