use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use trakem2_core::config::{load_and_validate, load_from_path, load_or_default, load_tree_file};
use trakem2_core::errors::Trakem2Error;
use trakem2_core::tree::{LayerId, Radius, SequentialIds, Tree};

const TREE_DOC: &str = r##"
[tree]
title = "axon 12"
transform = [1.0, 0.0, 0.0, 1.0, 10.0, 0.0]
color = "#00ff00"
alpha = 0.5

[[layer]]
id = 1
z = 0.0

[[layer]]
id = 2
z = 4.0

[[node]]
id = 10
x = 0.0
y = 0.0
layer = 1
r = "3"

[[node]]
id = 11
parent = 10
x = 5.0
y = 0.0
layer = 2

[[node]]
id = 12
parent = 10
x = 0.0
y = 5.0
layer = 2
confidence = 1
"##;

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn settings_sections_are_optional() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "trakem2.toml", "[picking]\nradius_px = 4.0\n");

    let settings = load_and_validate(&path).unwrap();
    assert_eq!(settings.picking.radius_px, 4.0);
    assert_eq!(settings.supervisor.fast_poll_ms, 1000);
    assert_eq!(settings.supervisor.headless_poll_ms, 60_000);
    assert_eq!(settings.projection.scale, 1.0);
}

#[test]
fn invalid_settings_are_rejected_after_parsing() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "trakem2.toml", "[supervisor]\nfast_poll_ms = 0\n");

    assert!(load_from_path(&path).is_ok());
    assert!(matches!(load_and_validate(&path), Err(Trakem2Error::ConfigError(_))));
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "trakem2.toml", "[supervisor\n");
    assert!(matches!(load_from_path(&path), Err(Trakem2Error::TomlError(_))));
}

#[test]
fn missing_settings_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let settings = load_or_default(dir.path().join("absent.toml")).unwrap();
    assert_eq!(settings.picking.radius_px, 10.0);
    assert!(matches!(
        load_and_validate(dir.path().join("absent.toml")),
        Err(Trakem2Error::IoError(_))
    ));
}

#[test]
fn tree_document_builds_a_tree() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "tree.toml", TREE_DOC);

    let file = load_tree_file(&path).unwrap();
    assert_eq!(file.node_count(), 3);
    let tree: Tree<Radius> = file.build(Arc::new(SequentialIds::default())).unwrap();

    assert_eq!(tree.meta().title, "axon 12");
    assert_eq!(tree.meta().alpha, 0.5);
    assert_eq!(tree.meta().color.to_hex(), "#00ff00");
    assert_eq!(tree.len(), 3);
    tree.check_invariants().unwrap();

    let root = tree.root().unwrap();
    assert_eq!(tree.node(root).unwrap().data(), &Radius(3.0));
    let child_layers: Vec<LayerId> = tree
        .children(root)
        .iter()
        .map(|c| tree.node(*c).unwrap().layer())
        .collect();
    assert_eq!(child_layers, vec![LayerId(2), LayerId(2)]);

    let layers = file.layer_table();
    assert_eq!(layers.z(LayerId(2)), Some(4.0));
}

#[test]
fn tree_document_with_unknown_parent_is_rejected() {
    let dir = TempDir::new().unwrap();
    let doc = TREE_DOC.replace("parent = 10\nx = 5.0", "parent = 99\nx = 5.0");
    let path = write(&dir, "tree.toml", &doc);

    let err = load_tree_file(&path).unwrap_err();
    assert!(err.to_string().contains("unknown parent 99"), "{err}");
}
