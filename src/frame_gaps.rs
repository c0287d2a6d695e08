//! Synthetic-frame binning for logs with unusable frame correlation
//!
//! Several recorded sessions carry `frame_index: -1` on every event, so
//! the events cannot be attributed to video frames directly. Instead,
//! events are binned into synthetic frames by time window: at 30 fps a
//! frame spans ~33.33 ms, and an event's frame is the floor of its offset
//! from the first event divided by that window. Crowded frames and rapid
//! event bursts are what stall the downstream verification pipeline, so
//! both get reported.

use crate::event::Event;
use serde::Serialize;
use std::collections::HashMap;

/// Windows holding more than this many events count as bursts.
const BURST_MIN_EVENTS: usize = 10;

const TOP_FRAMES: usize = 10;
const TOP_BURSTS: usize = 5;
const LEADING_EVENTS: usize = 10;

/// One synthetic frame and the events that landed in it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameWindow {
    pub frame: i64,
    pub count: usize,
    /// Window start/end relative to the first event, in milliseconds
    pub start_ms: f64,
    pub end_ms: f64,
}

/// A time window (anchored at one event) holding a rapid run of events
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Burst {
    /// Timestamp of the anchoring event, in milliseconds
    pub start_ms: f64,
    pub count: usize,
    /// Action tags of the first events in the window
    pub leading_actions: Vec<String>,
}

/// Result of the optional crowded-frame threshold check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdCheck {
    pub min_actions: usize,
    pub satisfied: bool,
    /// When satisfied: the first events in the crowded frame
    pub leading_events: Vec<ThresholdEvent>,
    /// When satisfied: how many more events the frame holds
    pub remaining: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdEvent {
    pub action: String,
    pub time_stamp_ms: f64,
}

/// Full synthetic-frame report for one event log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameGapReport {
    pub total_events: usize,
    /// Events skipped because they carry no timestamp
    pub untimed_events: usize,
    pub fps: f64,
    pub frame_duration_ms: f64,
    /// Synthetic frames sorted by event count, descending
    pub top_frames: Vec<FrameWindow>,
    pub threshold: Option<ThresholdCheck>,
    /// Top bursts by size, descending
    pub bursts: Vec<Burst>,
    /// Total burst windows found (may exceed `bursts.len()`)
    pub burst_count: usize,
}

/// Bin events into synthetic frames and scan for bursts.
///
/// Binning is relative to the first timestamped event; events without a
/// `time_stamp_ms` cannot be placed and are counted separately.
pub fn analyze(events: &[Event], fps: f64, min_actions: Option<usize>) -> FrameGapReport {
    let frame_duration_ms = 1000.0 / fps;

    let timed: Vec<(f64, &Event)> = events
        .iter()
        .filter_map(|e| e.time_stamp_ms.map(|ts| (ts, e)))
        .collect();
    let untimed_events = events.len() - timed.len();
    if untimed_events > 0 {
        tracing::warn!(untimed_events, "events without time_stamp_ms skipped");
    }

    let mut groups: HashMap<i64, Vec<&Event>> = HashMap::new();
    if let Some(&(first_ts, _)) = timed.first() {
        for &(ts, event) in &timed {
            let frame = ((ts - first_ts) / frame_duration_ms).floor() as i64;
            groups.entry(frame).or_default().push(event);
        }
    }

    let mut top_frames: Vec<FrameWindow> = groups
        .iter()
        .map(|(&frame, frame_events)| FrameWindow {
            frame,
            count: frame_events.len(),
            start_ms: frame as f64 * frame_duration_ms,
            end_ms: (frame + 1) as f64 * frame_duration_ms,
        })
        .collect();
    top_frames.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.frame.cmp(&b.frame)));

    let threshold = min_actions.map(|min| {
        let crowded = top_frames.first().filter(|w| w.count >= min);
        match crowded {
            Some(window) => {
                let frame_events = &groups[&window.frame];
                let leading_events = frame_events
                    .iter()
                    .take(LEADING_EVENTS)
                    .map(|e| ThresholdEvent {
                        action: e.action_tag().to_string(),
                        time_stamp_ms: e.time_stamp_ms.unwrap_or(0.0),
                    })
                    .collect();
                ThresholdCheck {
                    min_actions: min,
                    satisfied: true,
                    leading_events,
                    remaining: frame_events.len().saturating_sub(LEADING_EVENTS),
                }
            }
            None => ThresholdCheck {
                min_actions: min,
                satisfied: false,
                leading_events: Vec::new(),
                remaining: 0,
            },
        }
    });

    // Burst scan: anchor a window at every event and count what falls in
    // it. Quadratic, but logs top out at a few thousand records.
    let mut bursts: Vec<Burst> = Vec::new();
    for &(start, _) in &timed {
        let end = start + frame_duration_ms;
        let in_window: Vec<&Event> = timed
            .iter()
            .filter(|&&(ts, _)| ts >= start && ts < end)
            .map(|&(_, e)| e)
            .collect();
        if in_window.len() > BURST_MIN_EVENTS {
            bursts.push(Burst {
                start_ms: start,
                count: in_window.len(),
                leading_actions: in_window
                    .iter()
                    .take(LEADING_EVENTS)
                    .map(|e| e.action_tag().to_string())
                    .collect(),
            });
        }
    }
    bursts.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.start_ms.partial_cmp(&b.start_ms).unwrap_or(std::cmp::Ordering::Equal))
    });
    let burst_count = bursts.len();
    bursts.truncate(TOP_BURSTS);

    FrameGapReport {
        total_events: events.len(),
        untimed_events,
        fps,
        frame_duration_ms,
        top_frames,
        threshold,
        bursts,
        burst_count,
    }
}

impl FrameGapReport {
    pub fn print_text(&self) {
        println!("Total events: {}", self.total_events);
        println!(
            "Video FPS: {} (frame duration: {:.2}ms)",
            self.fps, self.frame_duration_ms
        );
        if self.untimed_events > 0 {
            println!("Events without timestamps: {}", self.untimed_events);
        }
        println!();

        if let Some(max) = self.top_frames.first() {
            println!(
                "Frame with most actions: Frame {} with {} actions",
                max.frame, max.count
            );
            println!();
            println!("Top {} frames by action count:", TOP_FRAMES.min(self.top_frames.len()));
            for window in self.top_frames.iter().take(TOP_FRAMES) {
                println!(
                    "  Frame {}: {} actions (time: {:.2}ms - {:.2}ms)",
                    window.frame, window.count, window.start_ms, window.end_ms
                );
            }
        } else {
            println!("No timestamped events to bin.");
        }

        if let Some(check) = &self.threshold {
            println!();
            println!("{}", "=".repeat(60));
            println!(
                "Analysis: Is there a frame with {}+ actions?",
                check.min_actions
            );
            if check.satisfied {
                let max = self.top_frames.first().expect("satisfied check has a frame");
                println!("  YES - Found frame {} with {} actions", max.frame, max.count);
                println!("  Events in that frame:");
                for (i, ev) in check.leading_events.iter().enumerate() {
                    println!("    {}. {} at {:.2}ms", i + 1, ev.action, ev.time_stamp_ms);
                }
                if check.remaining > 0 {
                    println!("    ... and {} more", check.remaining);
                }
            } else {
                let max_count = self.top_frames.first().map_or(0, |w| w.count);
                println!(
                    "  NO - Maximum is {max_count} actions in a single frame"
                );
            }
        }

        println!();
        println!("{}", "=".repeat(60));
        println!(
            "Checking for rapid event bursts (events within {:.2}ms windows):",
            self.frame_duration_ms
        );
        if self.bursts.is_empty() {
            println!("  No significant bursts found using time-based windows");
        } else {
            println!(
                "Found {} time windows with {}+ events:",
                self.burst_count,
                BURST_MIN_EVENTS + 1
            );
            for burst in &self.bursts {
                println!(
                    "  Window starting at {:.2}ms: {} events",
                    burst.start_ms, burst.count
                );
                println!("    Actions: {}", burst.leading_actions.join(", "));
                if burst.count > burst.leading_actions.len() {
                    println!(
                        "    ... and {} more",
                        burst.count - burst.leading_actions.len()
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_at(action: &str, ts: f64) -> Event {
        Event {
            action: Some(action.to_string()),
            time_stamp_ms: Some(ts),
            ..Event::default()
        }
    }

    #[test]
    fn test_binning_relative_to_first_event() {
        // 30 fps => 33.33ms frames. Offsets 0, 10 land in frame 0; 40 in frame 1.
        let events = vec![
            event_at("move", 1000.0),
            event_at("move", 1010.0),
            event_at("click", 1040.0),
        ];
        let report = analyze(&events, 30.0, None);
        let frame0 = report.top_frames.iter().find(|w| w.frame == 0).unwrap();
        let frame1 = report.top_frames.iter().find(|w| w.frame == 1).unwrap();
        assert_eq!(frame0.count, 2);
        assert_eq!(frame1.count, 1);
    }

    #[test]
    fn test_top_frames_sorted_by_count() {
        let mut events = Vec::new();
        // Frame 0 gets 3 events, frame 3 gets 5, frame 6 gets 1.
        for i in 0..3 {
            events.push(event_at("move", i as f64));
        }
        for i in 0..5 {
            events.push(event_at("press", 100.0 + i as f64));
        }
        events.push(event_at("click", 200.0));
        let report = analyze(&events, 30.0, None);
        assert_eq!(report.top_frames[0].count, 5);
        assert_eq!(report.top_frames[1].count, 3);
        assert_eq!(report.top_frames[2].count, 1);
    }

    #[test]
    fn test_window_bounds_reported() {
        let events = vec![event_at("move", 0.0)];
        let report = analyze(&events, 30.0, None);
        let w = &report.top_frames[0];
        assert_eq!(w.start_ms, 0.0);
        assert!((w.end_ms - 1000.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_not_satisfied() {
        let events = vec![event_at("move", 0.0), event_at("move", 1.0)];
        let report = analyze(&events, 30.0, Some(44));
        let check = report.threshold.unwrap();
        assert!(!check.satisfied);
        assert!(check.leading_events.is_empty());
    }

    #[test]
    fn test_threshold_satisfied_lists_leading_events() {
        let events: Vec<Event> = (0..15).map(|i| event_at("press", i as f64)).collect();
        let report = analyze(&events, 30.0, Some(12));
        let check = report.threshold.unwrap();
        assert!(check.satisfied);
        assert_eq!(check.leading_events.len(), 10);
        assert_eq!(check.remaining, 5);
        assert_eq!(check.leading_events[0].action, "press");
    }

    #[test]
    fn test_burst_detection() {
        // 12 events inside one 33.33ms window, anchored at the first.
        let mut events: Vec<Event> = (0..12).map(|i| event_at("press", i as f64 * 2.0)).collect();
        // A lone event far away; no burst around it.
        events.push(event_at("click", 10_000.0));
        let report = analyze(&events, 30.0, None);
        assert!(report.burst_count >= 1);
        assert_eq!(report.bursts[0].count, 12);
        assert_eq!(report.bursts[0].start_ms, 0.0);
    }

    #[test]
    fn test_no_bursts_in_sparse_log() {
        let events: Vec<Event> = (0..20).map(|i| event_at("move", i as f64 * 100.0)).collect();
        let report = analyze(&events, 30.0, None);
        assert_eq!(report.burst_count, 0);
        assert!(report.bursts.is_empty());
    }

    #[test]
    fn test_bursts_truncated_to_top_five() {
        // Every event anchors a window holding all 40 events.
        let events: Vec<Event> = (0..40).map(|i| event_at("press", i as f64 * 0.1)).collect();
        let report = analyze(&events, 30.0, None);
        assert!(report.burst_count > 5);
        assert_eq!(report.bursts.len(), 5);
    }

    #[test]
    fn test_untimed_events_skipped() {
        let events = vec![
            event_at("move", 0.0),
            Event {
                action: Some("click".to_string()),
                ..Event::default()
            },
        ];
        let report = analyze(&events, 30.0, None);
        assert_eq!(report.total_events, 2);
        assert_eq!(report.untimed_events, 1);
        assert_eq!(report.top_frames.iter().map(|w| w.count).sum::<usize>(), 1);
    }

    #[test]
    fn test_empty_log() {
        let report = analyze(&[], 30.0, Some(44));
        assert_eq!(report.total_events, 0);
        assert!(report.top_frames.is_empty());
        assert!(!report.threshold.as_ref().unwrap().satisfied);
        // Printing must not panic on the empty report.
        report.print_text();
    }

    #[test]
    fn test_custom_fps_changes_window() {
        let events = vec![event_at("move", 0.0), event_at("move", 50.0)];
        // At 30 fps (33.33ms) these are different frames; at 10 fps (100ms) the same.
        let at30 = analyze(&events, 30.0, None);
        let at10 = analyze(&events, 10.0, None);
        assert_eq!(at30.top_frames.len(), 2);
        assert_eq!(at10.top_frames.len(), 1);
    }
}
