// src/jobs.rs

//! Background jobs shipped with the crate.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::supervisor::{Worker, WorkerContext};
use crate::tree::{LayerTable, Payload, ProjectionParams, Segment, Tree};

/// How many segments are measured between quit checks.
const CHECK_EVERY: usize = 1024;

/// Result of a [`MeshWorker`] run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshOutput {
    pub segments: Vec<Segment>,
    /// Sum of all segment lengths in calibrated units.
    pub cable_length: f64,
}

/// Projects a tree to 3D segments and measures its cable length.
///
/// The output lands in the shared slot returned by [`MeshWorker::output`]
/// only when the job completes without a quit request.
pub struct MeshWorker<P: Payload> {
    tree: Tree<P>,
    layers: LayerTable,
    params: ProjectionParams,
    output: Arc<Mutex<Option<MeshOutput>>>,
}

impl<P: Payload> MeshWorker<P> {
    pub fn new(tree: Tree<P>, layers: LayerTable, params: ProjectionParams) -> Self {
        Self {
            tree,
            layers,
            params,
            output: Arc::new(Mutex::new(None)),
        }
    }

    pub fn output(&self) -> Arc<Mutex<Option<MeshOutput>>> {
        Arc::clone(&self.output)
    }
}

impl<P: Payload> Worker for MeshWorker<P> {
    fn task_name(&self) -> String {
        format!("Meshing {}", self.tree.meta().title)
    }

    fn on_background(&self) -> bool {
        true
    }

    fn run(&mut self, ctx: &WorkerContext) -> anyhow::Result<()> {
        let layers = &self.layers;
        let segments = self
            .tree
            .project_to_segments(&self.params, |layer| layers.z(layer).unwrap_or(0.0));
        debug!(segments = segments.len(), "tree projected");

        let total = segments.len().max(1);
        let mut cable_length = 0.0;
        for (i, s) in segments.iter().enumerate() {
            if i % CHECK_EVERY == 0 {
                if ctx.is_quitted() {
                    info!(done = i, total, "meshing interrupted");
                    return Ok(());
                }
                ctx.set_progress(i as f32 / total as f32);
            }
            let (dx, dy, dz) = (s.child.x - s.parent.x, s.child.y - s.parent.y, s.child.z - s.parent.z);
            cable_length += (dx * dx + dy * dy + dz * dz).sqrt();
        }
        ctx.set_progress(1.0);

        let mut slot = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(MeshOutput {
            segments,
            cable_length,
        });
        Ok(())
    }
}
