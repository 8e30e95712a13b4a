// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{RawSettings, Settings};
use crate::config::tree_file::{RawTreeFile, TreeFile};
use crate::errors::Result;

/// Read a settings file without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettings> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let raw: RawSettings = toml::from_str(&contents)?;
    Ok(raw)
}

/// Read a settings file and validate it. Entry point for the rest of the
/// crate.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Settings> {
    let raw = load_from_path(&path)?;
    let settings = Settings::try_from(raw)?;
    debug!(path = %path.as_ref().display(), "settings loaded");
    Ok(settings)
}

/// Like [`load_and_validate`], but a missing file yields the defaults.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "no settings file; using defaults");
        return Settings::try_from(RawSettings::default());
    }
    load_and_validate(path)
}

/// Read and validate a tree document.
pub fn load_tree_file(path: impl AsRef<Path>) -> Result<TreeFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let raw: RawTreeFile = toml::from_str(&contents)?;
    TreeFile::try_from(raw)
}
