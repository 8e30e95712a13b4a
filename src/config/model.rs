// src/config/model.rs

use serde::Deserialize;

/// Settings file as read from TOML.
///
/// ```toml
/// [supervisor]
/// gui_enabled = true
/// fast_poll_ms = 1000
///
/// [picking]
/// radius_px = 10.0
///
/// [projection]
/// scale = 1.0
/// pixel_width = 1.0
/// pixel_height = 1.0
/// pixel_depth = 1.0
/// ```
///
/// All sections are optional and have reasonable defaults. Use
/// [`Settings::try_from`] (or `loader::load_and_validate`) to obtain a
/// validated [`Settings`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSettings {
    #[serde(default)]
    pub supervisor: SupervisorConfig,

    #[serde(default)]
    pub picking: PickingConfig,

    #[serde(default)]
    pub projection: ProjectionConfig,
}

/// Validated settings.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub supervisor: SupervisorConfig,
    pub picking: PickingConfig,
    pub projection: ProjectionConfig,
}

impl Settings {
    /// Build without validation. Only `validate.rs` and tests should need this.
    pub fn new_unchecked(raw: RawSettings) -> Self {
        Self {
            supervisor: raw.supervisor,
            picking: raw.picking,
            projection: raw.projection,
        }
    }
}

/// `[supervisor]` section: how often the monitor thread polls a running job.
///
/// Polling starts at `fast_poll_ms`, slows to `medium_poll_ms` once the job
/// has run for `medium_after_secs`, and to `slow_poll_ms` after
/// `slow_after_secs`. Without a GUI the monitor polls every
/// `headless_poll_ms`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SupervisorConfig {
    #[serde(default = "default_gui_enabled")]
    pub gui_enabled: bool,
    #[serde(default = "default_fast_poll_ms")]
    pub fast_poll_ms: u64,
    #[serde(default = "default_medium_poll_ms")]
    pub medium_poll_ms: u64,
    #[serde(default = "default_slow_poll_ms")]
    pub slow_poll_ms: u64,
    #[serde(default = "default_medium_after_secs")]
    pub medium_after_secs: u64,
    #[serde(default = "default_slow_after_secs")]
    pub slow_after_secs: u64,
    #[serde(default = "default_headless_poll_ms")]
    pub headless_poll_ms: u64,
}

fn default_gui_enabled() -> bool {
    true
}

fn default_fast_poll_ms() -> u64 {
    1000
}

fn default_medium_poll_ms() -> u64 {
    3000
}

fn default_slow_poll_ms() -> u64 {
    10_000
}

fn default_medium_after_secs() -> u64 {
    60
}

fn default_slow_after_secs() -> u64 {
    180
}

fn default_headless_poll_ms() -> u64 {
    60_000
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            gui_enabled: default_gui_enabled(),
            fast_poll_ms: default_fast_poll_ms(),
            medium_poll_ms: default_medium_poll_ms(),
            slow_poll_ms: default_slow_poll_ms(),
            medium_after_secs: default_medium_after_secs(),
            slow_after_secs: default_slow_after_secs(),
            headless_poll_ms: default_headless_poll_ms(),
        }
    }
}

/// `[picking]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PickingConfig {
    /// On-screen pick tolerance in pixels.
    #[serde(default = "default_radius_px")]
    pub radius_px: f64,
}

fn default_radius_px() -> f64 {
    crate::tree::spatial::DEFAULT_PICK_RADIUS_PX
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self {
            radius_px: default_radius_px(),
        }
    }
}

/// `[projection]` section: stack calibration and mesh scale.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectionConfig {
    #[serde(default = "default_unit")]
    pub scale: f64,
    #[serde(default = "default_unit")]
    pub pixel_width: f64,
    #[serde(default = "default_unit")]
    pub pixel_height: f64,
    /// Only its sign matters for projection.
    #[serde(default = "default_unit")]
    pub pixel_depth: f64,
}

fn default_unit() -> f64 {
    1.0
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            scale: default_unit(),
            pixel_width: default_unit(),
            pixel_height: default_unit(),
            pixel_depth: default_unit(),
        }
    }
}
