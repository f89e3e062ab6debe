//! Constants used throughout the accessibility engine
//!
//! This module centralizes limits and defaults so that the engine and the
//! tool layer agree on them.

use std::time::Duration;

/// Maximum number of components in an element path
pub const MAX_PATH_COMPONENTS: usize = 50;

/// Default deadline for path resolution and tree traversal
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Default tree depth for snapshot requests
pub const DEFAULT_TREE_DEPTH: usize = 3;

/// Depth used by the element finder's internal traversal
pub const FINDER_TRAVERSAL_DEPTH: usize = 10;

/// Default cap on finder results
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Default cap on events collected per observation window
pub const DEFAULT_MAX_EVENTS: usize = 1000;

/// Hard cap on events a caller may request per observation window
pub const MAX_EVENTS_LIMIT: usize = 10_000;

/// Default observation window in seconds
pub const DEFAULT_OBSERVE_DURATION_SECS: u64 = 30;

/// Shortest observation window in seconds
pub const MIN_OBSERVE_DURATION_SECS: u64 = 1;

/// Longest observation window in seconds; longer requests are clamped
pub const MAX_OBSERVE_DURATION_SECS: u64 = 300;

/// Requests above this many seconds are rejected instead of clamped
pub const OBSERVE_DURATION_HARD_CAP_SECS: u64 = 3600;

/// Capacity of the channel between an observation worker and its collector
pub const OBSERVER_CHANNEL_CAPACITY: usize = 1024;

/// Slice of time an observation worker spends in one bridge pump call
pub const OBSERVER_PUMP_INTERVAL: Duration = Duration::from_millis(50);

/// Length of the rate limiter's sliding window
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(1);

/// Default number of write actions allowed per second
pub const DEFAULT_RATE_LIMIT_PER_SECOND: usize = 10;

/// Bundle identifiers that are always write-blocked
pub const DEFAULT_BLOCKED_BUNDLE_IDS: [&str; 4] = [
    "com.apple.keychainaccess",
    "com.apple.Terminal",
    "com.googlecode.iterm2",
    "com.apple.systempreferences",
];

/// Custom attribute carrying an application's bundle identifier
pub const BUNDLE_IDENTIFIER_ATTRIBUTE: &str = "AXBundleIdentifier";
