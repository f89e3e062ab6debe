//! Collects events from an observation channel against a timer

use crate::constants::{MAX_OBSERVE_DURATION_SECS, MIN_OBSERVE_DURATION_SECS};
use ax_mcp_protocol::ObserverEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Outcome of one observation window
#[derive(Debug, Clone, PartialEq)]
pub struct EventCollectionResult {
    pub events: Vec<ObserverEvent>,
    /// An event arrived after the cap was reached
    pub truncated: bool,
    /// The channel closed before the timer fired
    pub early_termination: bool,
    /// The target process went away during the window
    pub application_terminated: bool,
    pub actual_duration: Duration,
}

/// Clamp a requested window to the supported range
pub fn clamp_duration(secs: u64) -> u64 {
    secs.clamp(MIN_OBSERVE_DURATION_SECS, MAX_OBSERVE_DURATION_SECS)
}

enum DrainEnd {
    Truncated,
    Closed,
}

async fn drain(
    rx: &mut mpsc::Receiver<ObserverEvent>,
    events: &mut Vec<ObserverEvent>,
    max_events: usize,
) -> DrainEnd {
    while let Some(event) = rx.recv().await {
        if events.len() >= max_events {
            return DrainEnd::Truncated;
        }
        events.push(event);
    }
    DrainEnd::Closed
}

/// Race draining `rx` against a `window` timer
///
/// Whichever finishes first wins. Events gathered before the timer fires are
/// kept.
pub async fn collect_events(
    rx: &mut mpsc::Receiver<ObserverEvent>,
    window: Duration,
    max_events: usize,
) -> EventCollectionResult {
    let started = Instant::now();
    let mut events = Vec::new();

    let end = tokio::select! {
        biased;
        end = drain(rx, &mut events, max_events) => Some(end),
        _ = tokio::time::sleep(window) => None,
    };

    let (truncated, early_termination) = match end {
        Some(DrainEnd::Truncated) => (true, false),
        Some(DrainEnd::Closed) => (false, true),
        None => (false, false),
    };

    tracing::debug!(
        target: "ax_mcp::observers",
        events = events.len(),
        truncated,
        early_termination,
        "collection finished"
    );
    EventCollectionResult {
        events,
        truncated,
        early_termination,
        application_terminated: false,
        actual_duration: started.elapsed(),
    }
}
