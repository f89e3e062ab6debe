//! Safety layer for write operations: throttling and app blocklist

mod blocklist;
mod rate_limiter;

pub use blocklist::ApplicationBlocklist;
pub use rate_limiter::{RateLimitResult, RateLimiter};
