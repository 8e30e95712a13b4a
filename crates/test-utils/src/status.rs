//! Status sink that records every call.

use std::sync::Mutex;

use anyhow::{anyhow, Result};
use trakem2_core::supervisor::StatusSink;

#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    Status { text: String, focus: bool },
    Progress(f32),
    CursorStart,
    CursorEnd,
}

#[derive(Debug, Default)]
pub struct RecordingStatus {
    events: Mutex<Vec<StatusEvent>>,
    fail: bool,
}

impl RecordingStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records calls but reports every one of them as failed.
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                StatusEvent::Status { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: StatusEvent) -> Result<()> {
        self.events.lock().unwrap().push(event);
        if self.fail {
            return Err(anyhow!("status sink unavailable"));
        }
        Ok(())
    }
}

impl StatusSink for RecordingStatus {
    fn show_status(&self, text: &str, allow_focus_steal: bool) -> Result<()> {
        self.record(StatusEvent::Status {
            text: text.to_string(),
            focus: allow_focus_steal,
        })
    }

    fn show_progress(&self, fraction: f32) -> Result<()> {
        self.record(StatusEvent::Progress(fraction))
    }

    fn start_waiting_cursor(&self) -> Result<()> {
        self.record(StatusEvent::CursorStart)
    }

    fn end_waiting_cursor(&self) -> Result<()> {
        self.record(StatusEvent::CursorEnd)
    }
}
