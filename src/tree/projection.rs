// src/tree/projection.rs

//! Projection of a tree into calibrated 3D line segments, one per edge, for
//! mesh generation.

use kurbo::{Affine, Point};

use super::arena::Tree;
use super::node::Node;
use super::payload::Payload;
use super::LayerId;

/// A point in calibrated 3D space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Line segment from a node's parent to the node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub parent: Point3,
    pub child: Point3,
}

/// Calibration and scaling applied to every projected point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionParams {
    /// Local-to-world transform, usually the tree's own.
    pub affine: Affine,
    pub pixel_width: f64,
    pub pixel_height: f64,
    /// `-1.0` when the stack's pixel depth is negative, else `1.0`.
    pub depth_sign: f64,
    pub scale: f64,
}

impl ProjectionParams {
    pub fn new(affine: Affine, pixel_width: f64, pixel_height: f64, pixel_depth: f64, scale: f64) -> Self {
        Self {
            affine,
            pixel_width,
            pixel_height,
            depth_sign: if pixel_depth < 0.0 { -1.0 } else { 1.0 },
            scale,
        }
    }

    /// Project one node position. Z comes from the layer's z coordinate and
    /// is scaled by the pixel *width*, as the stack is calibrated in x.
    pub fn project<P>(&self, node: &Node<P>, layer_z: f64) -> Point3 {
        let p: Point = self.affine * node.position();
        let sx = self.pixel_width * self.scale;
        let sy = self.pixel_height * self.scale;
        Point3 {
            x: p.x * sx,
            y: p.y * sy,
            z: layer_z * sx * self.depth_sign,
        }
    }
}

impl<P: Payload> Tree<P> {
    /// Segments for every edge, computing each node's 3D point exactly once.
    ///
    /// The walk carries the parent's projected point on the work stack next to
    /// the node handle, so no lookup table is needed and a node with many
    /// children is still projected a single time.
    pub fn project_to_segments<F>(&self, params: &ProjectionParams, layer_z: F) -> Vec<Segment>
    where
        F: Fn(LayerId) -> f64,
    {
        let mut out = Vec::with_capacity(self.len().saturating_sub(1));
        let Some(root) = self.root() else {
            return out;
        };
        let Some(root_node) = self.node(root) else {
            return out;
        };

        let root_point = params.project(root_node, layer_z(root_node.layer()));
        let mut stack = vec![(root, root_point)];
        while let Some((id, point)) = stack.pop() {
            for child in self.children(id) {
                let Some(child_node) = self.node(*child) else {
                    continue;
                };
                let child_point = params.project(child_node, layer_z(child_node.layer()));
                out.push(Segment {
                    parent: point,
                    child: child_point,
                });
                if !child_node.is_leaf() {
                    stack.push((*child, child_point));
                }
            }
        }
        out
    }

    /// Reference projection that recomputes both endpoints for every edge.
    pub fn project_to_segments_naive<F>(&self, params: &ProjectionParams, layer_z: F) -> Vec<Segment>
    where
        F: Fn(LayerId) -> f64,
    {
        self.edges()
            .filter_map(|(parent, child)| {
                let pn = self.node(parent)?;
                let cn = self.node(child)?;
                Some(Segment {
                    parent: params.project(pn, layer_z(pn.layer())),
                    child: params.project(cn, layer_z(cn.layer())),
                })
            })
            .collect()
    }
}
