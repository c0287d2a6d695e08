//! Pressed-click extraction and span analysis
//!
//! Downstream cursor verification seeks the video to the frame of each
//! click, so what matters here is where each pressed click sits in video
//! time and whether the recorded `frame_index` can be trusted for the
//! seek. In the sessions that prompted this tool it could not: every
//! click carried `frame_index: -1`.

use crate::event::Event;
use serde::Serialize;

/// One pressed click pulled from the event log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClickRecord {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub second_in_video: Option<f64>,
    pub frame_index: Option<i64>,
    pub time_stamp_ms: Option<f64>,
    /// Frame estimated from `second_in_video` at the report's fps
    pub estimated_frame: Option<i64>,
}

/// First-to-last click span in video time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClickSpan {
    pub first_s: f64,
    pub last_s: f64,
    pub span_s: f64,
    /// Approximate frame distance between first and last click
    pub approx_frames: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClickReport {
    pub fps: f64,
    pub clicks: Vec<ClickRecord>,
    pub span: Option<ClickSpan>,
    /// True when every click carries `frame_index: -1`; seeking by the
    /// recorded frame index cannot work for such a session
    pub frame_index_unusable: bool,
}

/// Extract pressed clicks and compute their video-time span.
pub fn analyze(events: &[Event], fps: f64) -> ClickReport {
    let clicks: Vec<ClickRecord> = events
        .iter()
        .filter(|e| e.is_pressed_click())
        .map(|e| ClickRecord {
            x: e.x,
            y: e.y,
            second_in_video: e.second_in_video,
            frame_index: e.frame_index,
            time_stamp_ms: e.time_stamp_ms,
            estimated_frame: e.second_in_video.map(|s| (s * fps) as i64),
        })
        .collect();

    let span = match (
        clicks.first().and_then(|c| c.second_in_video),
        clicks.last().and_then(|c| c.second_in_video),
    ) {
        (Some(first_s), Some(last_s)) => {
            let span_s = last_s - first_s;
            Some(ClickSpan {
                first_s,
                last_s,
                span_s,
                approx_frames: (span_s * fps) as i64,
            })
        }
        _ => None,
    };

    let frame_index_unusable =
        !clicks.is_empty() && clicks.iter().all(|c| c.frame_index == Some(-1));

    ClickReport {
        fps,
        clicks,
        span,
        frame_index_unusable,
    }
}

impl ClickReport {
    pub fn print_text(&self) {
        println!("Total clicks: {}", self.clicks.len());
        println!();
        println!("Click events:");
        for (i, click) in self.clicks.iter().enumerate() {
            let second = click
                .second_in_video
                .map_or("?".to_string(), |s| format!("{s:.3}s"));
            let frame = click
                .estimated_frame
                .map_or("?".to_string(), |f| f.to_string());
            let x = click.x.map_or("?".to_string(), |v| v.to_string());
            let y = click.y.map_or("?".to_string(), |v| v.to_string());
            println!(
                "  {}. At {second} (frame ~{frame}) - Position: ({x}, {y})",
                i + 1
            );
        }

        println!();
        println!("Analysis:");
        match &self.span {
            Some(span) => {
                println!(
                    "  - Clicks span from {:.3}s to {:.3}s",
                    span.first_s, span.last_s
                );
                println!("  - That's {:.3} seconds", span.span_s);
                println!(
                    "  - At {}fps, that's approximately {} frames apart",
                    self.fps, span.approx_frames
                );
            }
            None => println!("  - No clicks with video timing to span"),
        }

        if self.frame_index_unusable {
            println!();
            println!("  ⚠️  Every click has frame_index=-1.");
            println!("  Seeking the video by recorded frame index cannot work for");
            println!("  this session; use second_in_video * fps instead.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(x: f64, y: f64, second: f64, frame_index: i64) -> Event {
        Event {
            action: Some("click".to_string()),
            pressed: Some(true),
            x: Some(x),
            y: Some(y),
            second_in_video: Some(second),
            frame_index: Some(frame_index),
            time_stamp_ms: Some(second * 1000.0),
            ..Event::default()
        }
    }

    #[test]
    fn test_only_pressed_clicks_extracted() {
        let mut events = vec![click(10.0, 20.0, 1.0, -1)];
        events.push(Event {
            action: Some("click".to_string()),
            pressed: Some(false),
            ..Event::default()
        });
        events.push(Event {
            action: Some("move".to_string()),
            ..Event::default()
        });
        let report = analyze(&events, 30.0);
        assert_eq!(report.clicks.len(), 1);
    }

    #[test]
    fn test_estimated_frame_truncates() {
        let events = vec![click(0.0, 0.0, 3.97, -1)];
        let report = analyze(&events, 30.0);
        // 3.97 * 30 = 119.1 -> frame 119
        assert_eq!(report.clicks[0].estimated_frame, Some(119));
    }

    #[test]
    fn test_span_first_to_last() {
        let events = vec![
            click(1.0, 1.0, 3.97, -1),
            click(2.0, 2.0, 7.06, -1),
            click(3.0, 3.0, 15.03, -1),
        ];
        let report = analyze(&events, 30.0);
        let span = report.span.unwrap();
        assert_eq!(span.first_s, 3.97);
        assert_eq!(span.last_s, 15.03);
        assert!((span.span_s - 11.06).abs() < 1e-9);
        assert_eq!(span.approx_frames, (11.06f64 * 30.0) as i64);
    }

    #[test]
    fn test_empty_log_is_a_report_not_an_error() {
        let report = analyze(&[], 30.0);
        assert!(report.clicks.is_empty());
        assert!(report.span.is_none());
        assert!(!report.frame_index_unusable);
        report.print_text();
    }

    #[test]
    fn test_frame_index_unusable_when_all_minus_one() {
        let events = vec![click(1.0, 1.0, 1.0, -1), click(2.0, 2.0, 2.0, -1)];
        assert!(analyze(&events, 30.0).frame_index_unusable);
    }

    #[test]
    fn test_frame_index_usable_when_any_real() {
        let events = vec![click(1.0, 1.0, 1.0, -1), click(2.0, 2.0, 2.0, 60)];
        assert!(!analyze(&events, 30.0).frame_index_unusable);
    }

    #[test]
    fn test_click_without_video_timing() {
        let events = vec![Event {
            action: Some("click".to_string()),
            pressed: Some(true),
            x: Some(5.0),
            y: Some(6.0),
            ..Event::default()
        }];
        let report = analyze(&events, 30.0);
        assert_eq!(report.clicks.len(), 1);
        assert!(report.clicks[0].estimated_frame.is_none());
        assert!(report.span.is_none());
        report.print_text();
    }
}
