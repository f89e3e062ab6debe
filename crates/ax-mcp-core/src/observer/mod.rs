//! Observation pipeline
//!
//! A session subscribes to native notifications on a dedicated worker thread,
//! forwards translated events over a bounded channel, and is collected for a
//! bounded window. Teardown runs on every exit path: the worker unsubscribes
//! and is joined before `collect` returns, and dropping a session does the
//! same.

mod collector;
mod manager;
mod worker;

pub use collector::{EventCollectionResult, clamp_duration, collect_events};
pub use manager::{ObservationRequest, ObservationSession, ObserverManager};
pub use worker::ObservationWorker;
