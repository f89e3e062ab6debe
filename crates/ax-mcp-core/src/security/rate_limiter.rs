//! Sliding-window throttle for write operations

use crate::constants::{DEFAULT_RATE_LIMIT_PER_SECOND, RATE_LIMIT_WINDOW};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Outcome of a throttled call; callers are never rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub delay_applied: Option<Duration>,
}

impl RateLimitResult {
    /// Caller-facing note when the call was held back
    pub fn warning_message(&self) -> Option<String> {
        self.delay_applied
            .map(|delay| format!("Rate limit reached. Delayed {:.3}s", delay.as_secs_f64()))
    }
}

/// Delays callers so at most `max_per_second` proceed in any one-second window
///
/// Callers are serialized through one async mutex, which stays held across
/// the delay.
#[derive(Debug)]
pub struct RateLimiter {
    max_per_second: usize,
    window: Mutex<VecDeque<Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_LIMIT_PER_SECOND)
    }
}

impl RateLimiter {
    /// A zero limit is treated as one action per second
    pub fn new(max_per_second: usize) -> Self {
        Self {
            max_per_second: max_per_second.max(1),
            window: Mutex::new(VecDeque::new()),
        }
    }

    pub fn max_per_second(&self) -> usize {
        self.max_per_second
    }

    /// Wait for capacity if needed, then record this call
    pub async fn check_and_record(&self) -> RateLimitResult {
        let mut window = self.window.lock().await;
        let now = Instant::now();
        expire(&mut window, now);

        // The call may proceed once the entry `max` places from the newest expires
        let delay = match window.len().checked_sub(self.max_per_second) {
            Some(gate) => (window[gate] + RATE_LIMIT_WINDOW).saturating_duration_since(now),
            None => Duration::ZERO,
        };

        let admitted = if delay.is_zero() {
            now
        } else {
            tracing::warn!(
                target: "ax_mcp::security",
                delay_ms = delay.as_millis() as u64,
                limit = self.max_per_second,
                "rate limit reached, delaying write"
            );
            tokio::time::sleep(delay).await;
            let admitted = Instant::now();
            expire(&mut window, admitted);
            admitted
        };
        window.push_back(admitted);

        RateLimitResult {
            allowed: true,
            delay_applied: (!delay.is_zero()).then_some(delay),
        }
    }
}

/// Drop entries that fell out of the window ending at `now`
fn expire(window: &mut VecDeque<Instant>, now: Instant) {
    while window
        .front()
        .is_some_and(|t| now.saturating_duration_since(*t) >= RATE_LIMIT_WINDOW)
    {
        window.pop_front();
    }
}
