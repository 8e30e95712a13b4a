// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod export;
pub mod jobs;
pub mod logging;
pub mod supervisor;
pub mod tree;

use std::path::Path;
use std::sync::{Arc, PoisonError};

use anyhow::{Context, Result};
use kurbo::Point;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command, NearestArgs};
use crate::config::{load_or_default, load_tree_file, Settings};
use crate::jobs::MeshWorker;
use crate::supervisor::{Bureaucrat, OwningContext, Project, TracingStatus};
use crate::tree::spatial::Picker;
use crate::tree::{LayerId, LayerTable, ProjectionParams, Radius, SequentialIds, Tree};

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> Result<()> {
    let settings = load_or_default(&args.config)
        .with_context(|| format!("loading settings from {}", args.config.display()))?;

    match args.command {
        Command::Segments(t) => print_segments(&settings, &t.tree),
        Command::Nearest(n) => print_nearest(&settings, &n),
        Command::ExportXml(t) => print_xml(&t.tree),
        Command::Mesh(t) => run_mesh(&settings, &t.tree).await,
    }
}

fn load_tree(path: &Path) -> Result<(Tree<Radius>, LayerTable)> {
    let file = load_tree_file(path)
        .with_context(|| format!("loading tree document {}", path.display()))?;
    let tree = file.build(Arc::new(SequentialIds::default()))?;
    debug!(tree = tree.id(), nodes = tree.len(), "tree loaded");
    Ok((tree, file.layer_table()))
}

fn projection_params(settings: &Settings, tree: &Tree<Radius>) -> ProjectionParams {
    let p = &settings.projection;
    ProjectionParams::new(tree.transform(), p.pixel_width, p.pixel_height, p.pixel_depth, p.scale)
}

fn print_segments(settings: &Settings, path: &Path) -> Result<()> {
    let (tree, layers) = load_tree(path)?;
    let params = projection_params(settings, &tree);
    let segments = tree.project_to_segments(&params, |l| layers.z(l).unwrap_or(0.0));
    for s in &segments {
        println!(
            "{} {} {} -> {} {} {}",
            s.parent.x, s.parent.y, s.parent.z, s.child.x, s.child.y, s.child.z
        );
    }
    info!(segments = segments.len(), "segments printed");
    Ok(())
}

fn print_nearest(settings: &Settings, args: &NearestArgs) -> Result<()> {
    let (tree, _layers) = load_tree(&args.tree)?;
    let picker = Picker::new(settings.picking.radius_px);
    let hit = picker.find_nearest_world(
        &tree,
        Point::new(args.x, args.y),
        LayerId(args.layer),
        args.magnification,
    );
    match hit.and_then(|id| tree.node(id)) {
        Some(node) => println!(
            "node {} at ({}, {}) layer {} r={}",
            node.uid(),
            node.x(),
            node.y(),
            node.layer(),
            node.data().0
        ),
        None => println!("no node within reach"),
    }
    Ok(())
}

fn print_xml(path: &Path) -> Result<()> {
    let (tree, _layers) = load_tree(path)?;
    let mut out = String::new();
    export::write_tree(&tree, "", &mut out)?;
    print!("{out}");
    Ok(())
}

async fn run_mesh(settings: &Settings, path: &Path) -> Result<()> {
    let (tree, layers) = load_tree(path)?;
    let params = projection_params(settings, &tree);
    let project = Arc::new(Project::new(tree.meta().title.clone()));

    let worker = MeshWorker::new(tree, layers, params);
    let output = worker.output();

    let bureaucrat = Bureaucrat::new(Arc::new(TracingStatus), &settings.supervisor);
    let contexts = vec![project.clone() as Arc<dyn OwningContext>];
    let handle = bureaucrat.create_and_start(worker, contexts)?;

    tokio::select! {
        _ = handle.finished() => {}
        res = tokio::signal::ctrl_c() => {
            res.context("listening for Ctrl+C")?;
            warn!(job = %handle.id(), "Ctrl+C received; cancelling");
            let h = handle.clone();
            tokio::task::spawn_blocking(move || h.request_cancel()).await?;
        }
    }

    let result = output.lock().unwrap_or_else(PoisonError::into_inner).take();
    match result {
        Some(mesh) => println!(
            "{} segments, cable length {:.3}",
            mesh.segments.len(),
            mesh.cable_length
        ),
        None => println!("meshing did not complete ({:?})", handle.phase()),
    }
    debug!(pending = project.has_pending_jobs(), "mesh job finished");
    Ok(())
}
