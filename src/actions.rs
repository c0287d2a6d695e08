//! Action tallies for one event log
//!
//! Move events dominate recorded sessions by an order of magnitude, so the
//! first question about any log is how many events are left once moves are
//! set aside, and what kinds they are.

use crate::event::Event;
use serde::Serialize;
use std::collections::BTreeMap;

/// Move vs non-move tallies with a per-action breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActionReport {
    pub total: u64,
    pub moves: u64,
    pub non_moves: u64,
    /// Non-move action counts, keyed by action tag (sorted by tag)
    pub breakdown: BTreeMap<String, u64>,
}

/// Tally events into move vs non-move, breaking non-moves down by tag.
pub fn tally(events: &[Event]) -> ActionReport {
    let mut report = ActionReport::default();
    for event in events {
        report.total += 1;
        if event.is_move() {
            report.moves += 1;
        } else {
            report.non_moves += 1;
            *report
                .breakdown
                .entry(event.action_tag().to_string())
                .or_insert(0) += 1;
        }
    }
    report
}

/// Count all events by action tag, most common first.
///
/// Ties break alphabetically so the ordering is stable across runs.
pub fn counts_most_common(events: &[Event]) -> Vec<(String, u64)> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for event in events {
        *counts.entry(event.action_tag().to_string()).or_insert(0) += 1;
    }
    let mut sorted: Vec<_> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

impl ActionReport {
    /// Print the report to stdout in the human-readable format.
    pub fn print_text(&self) {
        println!("Total events: {}", self.total);
        println!("Move actions: {}", self.moves);
        println!("Non-move actions: {}", self.non_moves);
        println!();
        println!("Non-move action breakdown:");
        for (action, count) in &self.breakdown {
            println!("  {action}: {count}");
        }
    }
}
