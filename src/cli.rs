//! CLI argument parsing for evstat

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for analysis reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "evstat")]
#[command(version)]
#[command(about = "Analyze recorded input-session event logs", long_about = None)]
pub struct Cli {
    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Enable debug logging to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Tally events by action tag, move vs non-move
    Actions {
        /// Path to events.jsonl
        events: PathBuf,
    },

    /// Bin events into synthetic frames by time window and find crowded
    /// frames and bursts (for logs where frame_index is unusable)
    FrameGaps {
        /// Path to events.jsonl
        events: PathBuf,

        /// Video frames per second
        #[arg(long, default_value = "30.0")]
        fps: f64,

        /// Also report whether any frame holds at least this many events
        #[arg(long = "min-actions", value_name = "N")]
        min_actions: Option<usize>,
    },

    /// List pressed clicks with positions and estimated video frames
    Clicks {
        /// Path to events.jsonl
        events: PathBuf,

        /// Video frames per second
        #[arg(long, default_value = "30.0")]
        fps: f64,
    },

    /// Full analysis of one or more session directories
    Session {
        /// Session directories, each holding events.jsonl, metadata.json
        /// and video.log
        #[arg(required = true)]
        dirs: Vec<PathBuf>,

        /// Report consecutive-event gaps larger than this, in milliseconds
        #[arg(long = "gap-ms", value_name = "MS", default_value = "500.0")]
        gap_ms: f64,

        /// Flag events whose frame_number exceeds frame_index by more than this
        #[arg(long = "drift-threshold", value_name = "N", default_value = "10")]
        drift_threshold: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_actions() {
        let cli = Cli::parse_from(["evstat", "actions", "events.jsonl"]);
        match cli.command {
            Command::Actions { events } => assert_eq!(events, PathBuf::from("events.jsonl")),
            other => panic!("expected Actions, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_format_default_text() {
        let cli = Cli::parse_from(["evstat", "actions", "events.jsonl"]);
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_format_json_global_after_subcommand() {
        let cli = Cli::parse_from(["evstat", "actions", "events.jsonl", "--format", "json"]);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_frame_gaps_defaults() {
        let cli = Cli::parse_from(["evstat", "frame-gaps", "events.jsonl"]);
        match cli.command {
            Command::FrameGaps {
                fps, min_actions, ..
            } => {
                assert_eq!(fps, 30.0);
                assert!(min_actions.is_none());
            }
            other => panic!("expected FrameGaps, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_frame_gaps_min_actions() {
        let cli = Cli::parse_from([
            "evstat",
            "frame-gaps",
            "events.jsonl",
            "--fps",
            "60",
            "--min-actions",
            "44",
        ]);
        match cli.command {
            Command::FrameGaps {
                fps, min_actions, ..
            } => {
                assert_eq!(fps, 60.0);
                assert_eq!(min_actions, Some(44));
            }
            other => panic!("expected FrameGaps, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_session_multiple_dirs() {
        let cli = Cli::parse_from(["evstat", "session", "a", "b", "--gap-ms", "250"]);
        match cli.command {
            Command::Session {
                dirs,
                gap_ms,
                drift_threshold,
            } => {
                assert_eq!(dirs.len(), 2);
                assert_eq!(gap_ms, 250.0);
                assert_eq!(drift_threshold, 10);
            }
            other => panic!("expected Session, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_session_requires_a_dir() {
        assert!(Cli::try_parse_from(["evstat", "session"]).is_err());
    }
}
