//! Session input files: `events.jsonl`, `metadata.json`, `video.log`
//!
//! A recorded session directory holds a line-delimited JSON event log, a
//! small metadata object, and a text video log whose line count stands in
//! for the number of captured frames. Everything here is read-only input;
//! nothing is written back.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced while loading session input files
#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: malformed event record")]
    MalformedLine {
        path: PathBuf,
        /// 1-based line number in the JSONL file
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed metadata in {path}")]
    MalformedMetadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One user-input event from `events.jsonl`.
///
/// Recorded logs are not schema-checked, so every field is optional here.
/// Each analysis picks the fields it needs and skips records missing them;
/// unknown fields are ignored on parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Action tag: "click", "press", "release", "move", "scroll", ...
    pub action: Option<String>,
    /// Wall-clock timestamp in milliseconds
    pub time_stamp_ms: Option<f64>,
    /// Offset into the session video, in seconds
    pub second_in_video: Option<f64>,
    /// Frame counter recorded by the capture pipeline
    pub frame_number: Option<i64>,
    /// Frame correlation attempted at record time; observed stuck at -1
    /// in several sessions, so treated as advisory only
    pub frame_index: Option<i64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    /// For click events: true on button-down, false on button-up
    pub pressed: Option<bool>,
}

impl Event {
    /// Action tag, with a stable placeholder for untagged records.
    pub fn action_tag(&self) -> &str {
        self.action.as_deref().unwrap_or("(none)")
    }

    pub fn is_move(&self) -> bool {
        self.action.as_deref() == Some("move")
    }

    /// A click event on button-down (the half that lands on a target).
    pub fn is_pressed_click(&self) -> bool {
        self.action.as_deref() == Some("click") && self.pressed == Some(true)
    }
}

/// Recording session metadata from `metadata.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub screen_width: u32,
    pub screen_height: u32,
    pub video_width: u32,
    pub video_height: u32,
    pub video_fps: f64,
}

impl Metadata {
    /// Ratio of screen to video horizontal resolution.
    pub fn scale_factor(&self) -> f64 {
        f64::from(self.screen_width) / f64::from(self.video_width)
    }
}

/// Number of header lines at the top of `video.log` that do not
/// correspond to captured frames.
const VIDEO_LOG_HEADER_LINES: usize = 2;

/// Load all events from a JSONL file, skipping blank lines.
///
/// A malformed line is a hard error carrying its 1-based line number;
/// the analyst needs to know exactly which record broke.
pub fn load_events(path: &Path) -> Result<Vec<Event>, EventLogError> {
    let contents = fs::read_to_string(path).map_err(|source| EventLogError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut events = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: Event =
            serde_json::from_str(line).map_err(|source| EventLogError::MalformedLine {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            })?;
        events.push(event);
    }

    tracing::debug!(path = %path.display(), count = events.len(), "loaded events");
    Ok(events)
}

/// Load the session metadata object.
pub fn load_metadata(path: &Path) -> Result<Metadata, EventLogError> {
    let contents = fs::read_to_string(path).map_err(|source| EventLogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| EventLogError::MalformedMetadata {
        path: path.to_path_buf(),
        source,
    })
}

/// Count captured frames from `video.log`: its line count minus the
/// header lines, saturating at zero for truncated logs.
pub fn count_video_frames(path: &Path) -> Result<u64, EventLogError> {
    let contents = fs::read_to_string(path).map_err(|source| EventLogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let lines = contents.lines().count();
    Ok(lines.saturating_sub(VIDEO_LOG_HEADER_LINES) as u64)
}
