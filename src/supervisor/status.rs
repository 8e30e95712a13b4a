// src/supervisor/status.rs

//! Status reporting collaborator and the status texts the monitor emits.

use std::fmt::Debug;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

/// Where the monitor sends human-readable status, progress and busy-cursor
/// requests. Errors are logged by the caller and never abort a job.
pub trait StatusSink: Send + Sync + Debug {
    /// `allow_focus_steal` is false for background jobs and periodic updates.
    fn show_status(&self, text: &str, allow_focus_steal: bool) -> Result<()>;

    /// Fraction in `[0, 1]`; `1.0` clears the indicator.
    fn show_progress(&self, fraction: f32) -> Result<()>;

    fn start_waiting_cursor(&self) -> Result<()>;

    fn end_waiting_cursor(&self) -> Result<()>;
}

/// Status sink for headless use: everything becomes a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingStatus;

impl StatusSink for TracingStatus {
    fn show_status(&self, text: &str, allow_focus_steal: bool) -> Result<()> {
        info!(target: "trakem2::status", focus = allow_focus_steal, "{text}");
        Ok(())
    }

    fn show_progress(&self, fraction: f32) -> Result<()> {
        info!(target: "trakem2::status", progress = fraction, "progress");
        Ok(())
    }

    fn start_waiting_cursor(&self) -> Result<()> {
        Ok(())
    }

    fn end_waiting_cursor(&self) -> Result<()> {
        Ok(())
    }
}

/// Elapsed time as shown in status text: `"42 seconds"` under a minute,
/// `"3' 7''"` (minutes and seconds) beyond.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{secs} seconds")
    } else {
        format!("{}' {}''", secs / 60, secs % 60)
    }
}

pub(crate) fn started_text(task: &str) -> String {
    format!("Started processing: {task}")
}

pub(crate) fn processing_text(task: &str, elapsed: Duration) -> String {
    format!("Processing... {task} - {}", format_elapsed(elapsed))
}

pub(crate) fn done_text(task: &str) -> String {
    format!("Done {task}")
}
