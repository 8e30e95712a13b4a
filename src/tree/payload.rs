// src/tree/payload.rs

//! Per-node payload capabilities.
//!
//! The payload kind is a type parameter of [`Tree`](super::Tree), so the hot
//! traversal paths are monomorphised instead of dispatching per node.

use std::fmt::Debug;

use crate::errors::{Result, Trakem2Error};

/// Capabilities every node payload provides: a default value and a textual
/// attribute form used by the XML export and the tree file format.
pub trait Payload: Clone + Debug + Default + PartialEq + Send + Sync + 'static {
    /// Attribute name in the serialized node element, or `None` when the
    /// payload carries nothing worth serialising.
    const ATTRIBUTE: Option<&'static str>;

    /// Format the payload for the node attribute.
    fn format_attribute(&self) -> String;

    /// Parse a value previously produced by [`Payload::format_attribute`].
    fn parse_attribute(value: &str) -> Result<Self>;
}

/// Payloads that can be nudged by a scalar delta (e.g. mouse-wheel radius
/// adjustment).
pub trait ScalarPayload: Payload {
    fn adjust(&mut self, delta: f32);
    fn scalar(&self) -> f32;
}

/// Radius of a treeline node, in the tree's local pixel units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Radius(pub f32);

impl Radius {
    /// Radius given to the first node created at the given magnification: a
    /// fixed screen-space size expressed in model units.
    pub fn initial_for(radius_px: f64, magnification: f64) -> Radius {
        Radius((radius_px / magnification) as f32)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }
}

impl Payload for Radius {
    const ATTRIBUTE: Option<&'static str> = Some("r");

    fn format_attribute(&self) -> String {
        self.0.to_string()
    }

    fn parse_attribute(value: &str) -> Result<Self> {
        value
            .trim()
            .parse::<f32>()
            .map(Radius)
            .map_err(|_| Trakem2Error::InvalidAttribute {
                name: "r".to_string(),
                value: value.to_string(),
            })
    }
}

impl ScalarPayload for Radius {
    fn adjust(&mut self, delta: f32) {
        self.0 += delta;
    }

    fn scalar(&self) -> f32 {
        self.0
    }
}

/// Payload of a plain tree whose nodes only carry position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoData;

impl Payload for NoData {
    const ATTRIBUTE: Option<&'static str> = None;

    fn format_attribute(&self) -> String {
        String::new()
    }

    fn parse_attribute(_value: &str) -> Result<Self> {
        Ok(NoData)
    }
}
