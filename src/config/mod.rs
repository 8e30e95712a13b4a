// src/config/mod.rs

//! Settings and tree documents read from TOML.
//!
//! - `model.rs` is the settings data model.
//! - `tree_file.rs` is the tree document model and its conversion into a
//!   [`Tree`](crate::tree::Tree).
//! - `loader.rs` reads files from disk.
//! - `validate.rs` holds the semantic checks behind the `TryFrom` impls.

pub mod loader;
pub mod model;
pub mod tree_file;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default, load_tree_file};
pub use model::{PickingConfig, ProjectionConfig, RawSettings, Settings, SupervisorConfig};
pub use tree_file::{LayerEntry, NodeEntry, RawTreeFile, TreeFile, TreeHeader};
