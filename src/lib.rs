//! evstat - event-log analyzer for recorded input sessions
//!
//! This library provides the analyses behind the `evstat` binary: action
//! tallies, synthetic-frame binning and burst detection, pressed-click
//! extraction, and full session diagnostics over `events.jsonl`,
//! `metadata.json` and `video.log`.

pub mod actions;
pub mod cli;
pub mod clicks;
pub mod event;
pub mod frame_gaps;
pub mod json_output;
pub mod session;
