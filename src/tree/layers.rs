// src/tree/layers.rs

use std::collections::BTreeMap;

use super::LayerId;

/// Z coordinate of every layer in a stack, in pixel units of the calibration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerTable {
    z: BTreeMap<LayerId, f64>,
}

impl LayerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, layer: LayerId, z: f64) {
        self.z.insert(layer, z);
    }

    pub fn z(&self, layer: LayerId) -> Option<f64> {
        self.z.get(&layer).copied()
    }

    pub fn contains(&self, layer: LayerId) -> bool {
        self.z.contains_key(&layer)
    }

    pub fn len(&self) -> usize {
        self.z.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LayerId, f64)> + '_ {
        self.z.iter().map(|(id, z)| (*id, *z))
    }
}

impl FromIterator<(LayerId, f64)> for LayerTable {
    fn from_iter<I: IntoIterator<Item = (LayerId, f64)>>(iter: I) -> Self {
        Self {
            z: iter.into_iter().collect(),
        }
    }
}
