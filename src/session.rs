//! Full analysis of recorded session directories
//!
//! This is the kitchen-sink pass used when a session times out in the
//! verification pipeline: video info from metadata, an action breakdown,
//! stalled frames, large inter-event gaps, frame-index drift, and a click
//! census, ending with an estimate of how long verification of the
//! session should take. Several sessions can be analyzed in one run; a
//! broken session is reported and the rest still get analyzed.

use crate::actions;
use crate::event::{self, Event, EventLogError, Metadata};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Frames holding more than this many events suggest a capture stall.
const STALL_MIN_EVENTS: usize = 5;

const TOP_STALLED_FRAMES: usize = 10;
const TOP_GAPS: usize = 10;

/// Per-verification cost bounds, in seconds (YOLO run per click, OCR run
/// per keypress pair).
const VERIFY_COST_LOW_S: f64 = 2.5;
const VERIFY_COST_HIGH_S: f64 = 3.0;

/// Tunable thresholds for one analysis run
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Consecutive-event gaps larger than this are reported, in ms
    pub gap_ms: f64,
    /// `frame_number - frame_index` larger than this counts as drift
    pub drift_threshold: i64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            gap_ms: 500.0,
            drift_threshold: 10,
        }
    }
}

/// Video facts pulled from `metadata.json` and `video.log`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoInfo {
    pub screen_width: u32,
    pub screen_height: u32,
    pub video_width: u32,
    pub video_height: u32,
    pub scale_factor: f64,
    pub fps: f64,
    pub total_frames: u64,
    pub duration_s: f64,
}

/// A recorded frame holding suspiciously many events
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StalledFrame {
    pub frame: i64,
    pub count: usize,
    /// Video time of the first event in the frame, in seconds
    pub video_time_s: f64,
}

/// A large gap between consecutive events
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeGap {
    /// Index of the event after the gap
    pub index: usize,
    pub gap_ms: f64,
    pub action: String,
    pub video_time_s: f64,
}

/// Frame-index vs frame-number drift summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DriftSummary {
    pub count: usize,
    pub max_drift: i64,
}

/// Click census for the cursor-verification estimate
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClickSummary {
    pub total: usize,
    pub unique_positions: usize,
    pub first_s: Option<f64>,
    pub last_s: Option<f64>,
}

/// Everything known about one session after a full pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub name: String,
    pub video: VideoInfo,
    pub total_events: usize,
    /// Event counts by action tag, most common first
    pub breakdown: Vec<(String, u64)>,
    pub stalled_frames: Vec<StalledFrame>,
    pub gap_threshold_ms: f64,
    /// Gaps above the threshold, in log order
    pub gaps: Vec<TimeGap>,
    pub drift_threshold: i64,
    pub drift: DriftSummary,
    pub clicks: ClickSummary,
    pub presses: usize,
    /// Verification workload: one model run per click, one per keypress pair
    pub verifications: usize,
}

/// A session that could not be analyzed
#[derive(Debug, Clone, Serialize)]
pub struct SessionFailure {
    pub name: String,
    pub error: String,
}

/// Outcome of analyzing a batch of session directories
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionRun {
    pub sessions: Vec<SessionReport>,
    pub failures: Vec<SessionFailure>,
}

fn session_name(dir: &Path) -> String {
    dir.file_name()
        .map_or_else(|| dir.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Analyze one session directory holding `events.jsonl`, `metadata.json`,
/// and `video.log`.
pub fn analyze_session(dir: &Path, opts: &SessionOptions) -> Result<SessionReport, EventLogError> {
    let events = event::load_events(&dir.join("events.jsonl"))?;
    let meta = event::load_metadata(&dir.join("metadata.json"))?;
    let total_frames = event::count_video_frames(&dir.join("video.log"))?;

    Ok(build_report(
        session_name(dir),
        &events,
        &meta,
        total_frames,
        opts,
    ))
}

/// Analyze every directory in the batch, continuing past failures.
pub fn analyze_all(dirs: &[PathBuf], opts: &SessionOptions) -> SessionRun {
    let mut run = SessionRun::default();
    for dir in dirs {
        match analyze_session(dir, opts) {
            Ok(report) => run.sessions.push(report),
            Err(err) => {
                tracing::error!(session = %dir.display(), error = %err, "session analysis failed");
                let name = session_name(dir);
                // Render the full cause chain; the typed error alone says
                // which file, the source says why.
                run.failures.push(SessionFailure {
                    name,
                    error: format!("{:#}", anyhow::Error::new(err)),
                });
            }
        }
    }
    run
}

fn build_report(
    name: String,
    events: &[Event],
    meta: &Metadata,
    total_frames: u64,
    opts: &SessionOptions,
) -> SessionReport {
    let video = VideoInfo {
        screen_width: meta.screen_width,
        screen_height: meta.screen_height,
        video_width: meta.video_width,
        video_height: meta.video_height,
        scale_factor: meta.scale_factor(),
        fps: meta.video_fps,
        total_frames,
        duration_s: if meta.video_fps > 0.0 {
            total_frames as f64 / meta.video_fps
        } else {
            0.0
        },
    };

    let breakdown = actions::counts_most_common(events);

    let stalled_frames = find_stalled_frames(events);
    let gaps = find_gaps(events, opts.gap_ms);
    let drift = check_drift(events, opts.drift_threshold);
    let clicks = click_summary(events);

    let presses = events
        .iter()
        .filter(|e| e.action.as_deref() == Some("press"))
        .count();
    let verifications = clicks.total + presses / 2;

    SessionReport {
        name,
        video,
        total_events: events.len(),
        breakdown,
        stalled_frames,
        gap_threshold_ms: opts.gap_ms,
        gaps,
        drift_threshold: opts.drift_threshold,
        drift,
        clicks,
        presses,
        verifications,
    }
}

/// Group events by recorded `frame_number` and keep the crowded frames.
fn find_stalled_frames(events: &[Event]) -> Vec<StalledFrame> {
    let mut frames: Vec<StalledFrame> = Vec::new();
    let mut seen: HashSet<i64> = HashSet::new();
    for e in events {
        let Some(frame) = e.frame_number else { continue };
        if !seen.insert(frame) {
            continue;
        }
        let frame_events: Vec<&Event> =
            events.iter().filter(|e| e.frame_number == Some(frame)).collect();
        if frame_events.len() > STALL_MIN_EVENTS {
            frames.push(StalledFrame {
                frame,
                count: frame_events.len(),
                video_time_s: frame_events[0].second_in_video.unwrap_or(0.0),
            });
        }
    }
    frames.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.frame.cmp(&b.frame)));
    frames.truncate(TOP_STALLED_FRAMES);
    frames
}

/// Scan consecutive timestamped events for deltas above the threshold.
fn find_gaps(events: &[Event], gap_ms: f64) -> Vec<TimeGap> {
    let mut gaps = Vec::new();
    for i in 1..events.len() {
        let (Some(prev), Some(curr)) = (events[i - 1].time_stamp_ms, events[i].time_stamp_ms)
        else {
            continue;
        };
        let gap = curr - prev;
        if gap > gap_ms {
            gaps.push(TimeGap {
                index: i,
                gap_ms: gap,
                action: events[i].action_tag().to_string(),
                video_time_s: events[i].second_in_video.unwrap_or(0.0),
            });
        }
    }
    gaps
}

/// Count events where `frame_number` has drifted ahead of `frame_index`.
fn check_drift(events: &[Event], threshold: i64) -> DriftSummary {
    let mut summary = DriftSummary::default();
    for e in events {
        let (Some(index), Some(number)) = (e.frame_index, e.frame_number) else {
            continue;
        };
        let diff = number - index;
        if diff > threshold {
            summary.count += 1;
            summary.max_drift = summary.max_drift.max(diff);
        }
    }
    summary
}

fn click_summary(events: &[Event]) -> ClickSummary {
    let clicks: Vec<&Event> = events
        .iter()
        .filter(|e| e.action.as_deref() == Some("click"))
        .collect();

    // f64 positions hashed by bit pattern; good enough for exact-duplicate
    // detection, which is all the census needs.
    let unique_positions = clicks
        .iter()
        .map(|e| (e.x.map(f64::to_bits), e.y.map(f64::to_bits)))
        .collect::<HashSet<_>>()
        .len();

    let times: Vec<f64> = clicks.iter().filter_map(|e| e.second_in_video).collect();
    ClickSummary {
        total: clicks.len(),
        unique_positions,
        first_s: times.iter().copied().reduce(f64::min),
        last_s: times.iter().copied().reduce(f64::max),
    }
}

impl SessionReport {
    pub fn print_text(&self) {
        println!();
        println!("{}", "=".repeat(60));
        println!("ANALYZING: {}", self.name);
        println!("{}", "=".repeat(60));

        println!();
        println!("📺 VIDEO INFO:");
        println!(
            "  Screen resolution: {}x{}",
            self.video.screen_width, self.video.screen_height
        );
        println!(
            "  Video resolution: {}x{}",
            self.video.video_width, self.video.video_height
        );
        println!("  Scale factor: {:.2}x", self.video.scale_factor);
        println!("  FPS: {}", self.video.fps);
        println!("  Total frames: {}", self.video.total_frames);
        println!("  Duration: ~{:.1}s", self.video.duration_s);

        println!();
        println!("📋 EVENT BREAKDOWN:");
        for (action, count) in &self.breakdown {
            println!("  {action}: {count}");
        }
        println!("  TOTAL EVENTS: {}", self.total_events);

        println!();
        println!("🔴 FRAMES WITH MANY EVENTS (potential lag/stalls):");
        if self.stalled_frames.is_empty() {
            println!("  None found - good!");
        } else {
            for frame in &self.stalled_frames {
                println!(
                    "  Frame {}: {} events (video time: {:.1}s)",
                    frame.frame, frame.count, frame.video_time_s
                );
            }
        }

        println!();
        println!("⏱️ LARGE TIME GAPS (>{:.0}ms):", self.gap_threshold_ms);
        if self.gaps.is_empty() {
            println!("  None found - good!");
        } else {
            for gap in self.gaps.iter().take(TOP_GAPS) {
                println!(
                    "  Gap of {:.0}ms at event {} (action: {}, video time: {:.1}s)",
                    gap.gap_ms, gap.index, gap.action, gap.video_time_s
                );
            }
            if self.gaps.len() > TOP_GAPS {
                println!("  ... and {} more gaps", self.gaps.len() - TOP_GAPS);
            }
        }

        println!();
        println!("🔍 FRAME INDEX CONSISTENCY CHECK:");
        if self.drift.count == 0 {
            println!("  No significant drift - good!");
        } else {
            println!(
                "  Found {} events with frame_number - frame_index > {}",
                self.drift.count, self.drift_threshold
            );
            println!("  Max drift: {}", self.drift.max_drift);
        }

        println!();
        println!("📍 CLICK EVENTS ANALYSIS (for cursor verification):");
        println!("  Total clicks: {}", self.clicks.total);
        println!("  Unique click positions: {}", self.clicks.unique_positions);
        if let (Some(first), Some(last)) = (self.clicks.first_s, self.clicks.last_s) {
            println!("  Click time range: {first:.1}s - {last:.1}s");
        }
    }
}

impl SessionRun {
    /// True when the run produced nothing usable.
    pub fn all_failed(&self) -> bool {
        self.sessions.is_empty() && !self.failures.is_empty()
    }

    pub fn print_text(&self) {
        for report in &self.sessions {
            report.print_text();
        }
        for failure in &self.failures {
            println!();
            println!("Error analyzing {}: {}", failure.name, failure.error);
        }

        println!();
        println!("{}", "=".repeat(70));
        println!("SUMMARY");
        println!("{}", "=".repeat(70));
        for report in &self.sessions {
            println!();
            println!("{}:", report.name);
            println!("  Total events: {}", report.total_events);
            println!("  Clicks to verify: {}", report.clicks.total);
            println!("  Keypresses to verify: {}", report.presses / 2);
            println!("  TOTAL VERIFICATIONS: {}", report.verifications);
            println!(
                "  Estimated time at {VERIFY_COST_LOW_S}-{VERIFY_COST_HIGH_S}s each: {:.1} - {:.1} minutes",
                report.verifications as f64 * VERIFY_COST_LOW_S / 60.0,
                report.verifications as f64 * VERIFY_COST_HIGH_S / 60.0
            );
        }
    }
}
