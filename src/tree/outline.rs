// src/tree/outline.rs

//! Tapered "pipe" silhouettes for radius edges.

use kurbo::{Point, Vec2};

use super::arena::Tree;
use super::payload::Radius;
use super::NodeId;

/// Quadrilateral spanned by offsetting both endpoints of an edge
/// perpendicular to it, each by its own radius.
///
/// Corner order: parent left, parent right, child right, child left. Returns
/// `None` when both radii are zero or the endpoints coincide.
pub fn pipe_outline(child: Point, child_r: f64, parent: Point, parent_r: f64) -> Option<[Point; 4]> {
    if child_r == 0.0 && parent_r == 0.0 {
        return None;
    }
    let v = parent - child;
    let len = v.hypot();
    if len == 0.0 || !len.is_finite() {
        return None;
    }
    let dir = v / len;
    let left = Vec2::new(-dir.y, dir.x);
    let right = -left;

    Some([
        parent + left * parent_r,
        parent + right * parent_r,
        child + right * child_r,
        child + left * child_r,
    ])
}

impl Tree<Radius> {
    /// Pipe outline of every edge, in world coordinates.
    pub fn radius_outlines(&self) -> Vec<(NodeId, [Point; 4])> {
        let transform = self.transform();
        self.edges()
            .filter_map(|(parent, child)| {
                let pn = self.node(parent)?;
                let cn = self.node(child)?;
                let quad = pipe_outline(
                    cn.position(),
                    f64::from(cn.data().0),
                    pn.position(),
                    f64::from(pn.data().0),
                )?;
                Some((child, quad.map(|p| transform * p)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_radii_produce_nothing() {
        assert!(pipe_outline(Point::new(0.0, 0.0), 0.0, Point::new(5.0, 0.0), 0.0).is_none());
    }

    #[test]
    fn coincident_endpoints_produce_nothing() {
        assert!(pipe_outline(Point::new(1.0, 1.0), 2.0, Point::new(1.0, 1.0), 2.0).is_none());
    }

    #[test]
    fn horizontal_edge_tapers() {
        let quad = pipe_outline(Point::new(0.0, 0.0), 1.0, Point::new(10.0, 0.0), 3.0).unwrap();
        assert_eq!(quad[0], Point::new(10.0, 3.0));
        assert_eq!(quad[1], Point::new(10.0, -3.0));
        assert_eq!(quad[2], Point::new(0.0, -1.0));
        assert_eq!(quad[3], Point::new(0.0, 1.0));
    }

    #[test]
    fn outlines_use_tree_transform() {
        use std::sync::Arc;

        use kurbo::Affine;

        use crate::tree::{Confidence, LayerId, SequentialIds};

        let mut t = Tree::new("pipe", Arc::new(SequentialIds::default()));
        let r = t.create_node(0.0, 0.0, LayerId(0), Radius(1.0));
        let c = t.create_node(0.0, 10.0, LayerId(0), Radius(1.0));
        let z = t.create_node(5.0, 10.0, LayerId(0), Radius(0.0));
        t.set_root(r).unwrap();
        t.attach(r, c, Confidence::MAX).unwrap();
        t.attach(c, z, Confidence::MAX).unwrap();
        t.set_transform(Affine::scale(2.0));

        let outlines = t.radius_outlines();
        assert_eq!(outlines.len(), 2);
        let (_, quad) = outlines[0];
        assert!(quad.iter().all(|p| p.y == 0.0 || p.y == 20.0));
    }
}
