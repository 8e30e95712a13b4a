// src/config/validate.rs

use std::collections::HashSet;

use kurbo::Affine;

use crate::config::model::{
    PickingConfig, ProjectionConfig, RawSettings, Settings, SupervisorConfig,
};
use crate::config::tree_file::{RawTreeFile, TreeFile};
use crate::errors::{Result, Trakem2Error};
use crate::tree::arena::Rgb;

impl TryFrom<RawSettings> for Settings {
    type Error = Trakem2Error;

    fn try_from(raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        validate_supervisor(&raw.supervisor)?;
        validate_picking(&raw.picking)?;
        validate_projection(&raw.projection)?;
        Ok(Settings::new_unchecked(raw))
    }
}

fn config_error(msg: impl Into<String>) -> Trakem2Error {
    Trakem2Error::ConfigError(msg.into())
}

fn validate_supervisor(cfg: &SupervisorConfig) -> Result<()> {
    let polls = [
        ("fast_poll_ms", cfg.fast_poll_ms),
        ("medium_poll_ms", cfg.medium_poll_ms),
        ("slow_poll_ms", cfg.slow_poll_ms),
        ("headless_poll_ms", cfg.headless_poll_ms),
    ];
    for (name, value) in polls {
        if value == 0 {
            return Err(config_error(format!("[supervisor].{name} must be > 0")));
        }
    }

    if cfg.fast_poll_ms > cfg.medium_poll_ms || cfg.medium_poll_ms > cfg.slow_poll_ms {
        return Err(config_error(format!(
            "[supervisor] poll intervals must not decrease (fast {} ms, medium {} ms, slow {} ms)",
            cfg.fast_poll_ms, cfg.medium_poll_ms, cfg.slow_poll_ms
        )));
    }

    if cfg.medium_after_secs > cfg.slow_after_secs {
        return Err(config_error(format!(
            "[supervisor].medium_after_secs ({}) must not exceed slow_after_secs ({})",
            cfg.medium_after_secs, cfg.slow_after_secs
        )));
    }
    Ok(())
}

fn validate_picking(cfg: &PickingConfig) -> Result<()> {
    if !cfg.radius_px.is_finite() || cfg.radius_px <= 0.0 {
        return Err(config_error(format!(
            "[picking].radius_px must be a positive number (got {})",
            cfg.radius_px
        )));
    }
    Ok(())
}

fn validate_projection(cfg: &ProjectionConfig) -> Result<()> {
    let values = [
        ("scale", cfg.scale),
        ("pixel_width", cfg.pixel_width),
        ("pixel_height", cfg.pixel_height),
        ("pixel_depth", cfg.pixel_depth),
    ];
    for (name, value) in values {
        if !value.is_finite() || value == 0.0 {
            return Err(config_error(format!(
                "[projection].{name} must be finite and non-zero (got {value})"
            )));
        }
    }
    Ok(())
}

impl TryFrom<RawTreeFile> for TreeFile {
    type Error = Trakem2Error;

    fn try_from(raw: RawTreeFile) -> std::result::Result<Self, Self::Error> {
        let color = validate_header(&raw)?;
        validate_nodes(&raw)?;
        Ok(TreeFile::new_unchecked(raw, color))
    }
}

fn validate_header(raw: &RawTreeFile) -> Result<Rgb> {
    let header = &raw.tree;
    let color: Rgb = header.color.parse().map_err(config_error)?;

    if !(0.0..=1.0).contains(&header.alpha) {
        return Err(config_error(format!(
            "[tree].alpha must be within [0, 1] (got {})",
            header.alpha
        )));
    }

    let det = Affine::new(header.transform).determinant();
    if !det.is_finite() || det == 0.0 {
        return Err(config_error("[tree].transform is not invertible"));
    }
    Ok(color)
}

fn validate_nodes(raw: &RawTreeFile) -> Result<()> {
    let mut layers = HashSet::new();
    for layer in &raw.layers {
        if !layers.insert(layer.id) {
            return Err(config_error(format!("duplicate layer id {}", layer.id)));
        }
    }

    let mut ids = HashSet::new();
    for node in &raw.nodes {
        if !ids.insert(node.id) {
            return Err(config_error(format!("duplicate node id {}", node.id)));
        }
    }

    let mut roots = 0usize;
    for node in &raw.nodes {
        match node.parent {
            None => roots += 1,
            Some(parent) if !ids.contains(&parent) => {
                return Err(config_error(format!(
                    "node {} has unknown parent {parent}",
                    node.id
                )));
            }
            Some(_) => {}
        }
        if !layers.contains(&node.layer) {
            return Err(config_error(format!(
                "node {} references unknown layer {}",
                node.id, node.layer
            )));
        }
    }

    if !raw.nodes.is_empty() && roots != 1 {
        return Err(config_error(format!(
            "tree must have exactly one root node (found {roots})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Settings::try_from(RawSettings::default()).is_ok());
    }

    #[test]
    fn zero_poll_is_rejected() {
        let mut raw = RawSettings::default();
        raw.supervisor.fast_poll_ms = 0;
        assert!(matches!(
            Settings::try_from(raw),
            Err(Trakem2Error::ConfigError(_))
        ));
    }

    #[test]
    fn decreasing_polls_are_rejected() {
        let mut raw = RawSettings::default();
        raw.supervisor.slow_poll_ms = 500;
        assert!(Settings::try_from(raw).is_err());
    }

    #[test]
    fn zero_pixel_size_is_rejected() {
        let mut raw = RawSettings::default();
        raw.projection.pixel_width = 0.0;
        assert!(Settings::try_from(raw).is_err());
    }

    #[test]
    fn negative_pixel_depth_is_allowed() {
        let mut raw = RawSettings::default();
        raw.projection.pixel_depth = -1.0;
        assert!(Settings::try_from(raw).is_ok());
    }

    fn tree_doc(body: &str) -> Result<TreeFile> {
        let raw: RawTreeFile = toml::from_str(&format!("[tree]\n{body}"))?;
        TreeFile::try_from(raw)
    }

    #[test]
    fn two_roots_are_rejected() {
        let err = tree_doc(
            "[[layer]]\nid = 1\nz = 0.0\n\
             [[node]]\nid = 1\nx = 0.0\ny = 0.0\nlayer = 1\n\
             [[node]]\nid = 2\nx = 0.0\ny = 0.0\nlayer = 1\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("exactly one root"));
    }

    #[test]
    fn unknown_layer_is_rejected() {
        let err = tree_doc("[[node]]\nid = 1\nx = 0.0\ny = 0.0\nlayer = 4\n").unwrap_err();
        assert!(err.to_string().contains("unknown layer 4"));
    }

    #[test]
    fn singular_transform_is_rejected() {
        let raw: RawTreeFile =
            toml::from_str("[tree]\ntransform = [0.0, 0.0, 0.0, 0.0, 1.0, 1.0]\n").unwrap();
        assert!(TreeFile::try_from(raw).is_err());
    }

    #[test]
    fn bad_color_is_rejected() {
        let raw: RawTreeFile = toml::from_str("[tree]\ncolor = \"yellow\"\n").unwrap();
        assert!(TreeFile::try_from(raw).is_err());
    }
}
