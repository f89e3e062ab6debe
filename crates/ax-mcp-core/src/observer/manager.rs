//! Registry of running observation sessions

use super::collector::{EventCollectionResult, clamp_duration, collect_events};
use super::worker::ObservationWorker;
use crate::bridge::{AccessibilityBridge, ElementHandle, ObserverBridge};
use crate::constants::{
    DEFAULT_MAX_EVENTS, DEFAULT_OBSERVE_DURATION_SECS, MAX_EVENTS_LIMIT,
    MAX_OBSERVE_DURATION_SECS, OBSERVE_DURATION_HARD_CAP_SECS,
};
use crate::errors::ObserverError;
use ax_mcp_protocol::{ObserverEvent, ObserverEventType};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Parameters of one observation
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRequest {
    pub pid: i32,
    /// Restrict notifications to this element's subtree
    pub element: Option<ElementHandle>,
    /// Empty means every event type
    pub event_types: Vec<ObserverEventType>,
    pub duration_secs: u64,
    pub max_events: usize,
}

impl ObservationRequest {
    pub fn new(pid: i32) -> Self {
        Self {
            pid,
            element: None,
            event_types: ObserverEventType::ALL.to_vec(),
            duration_secs: DEFAULT_OBSERVE_DURATION_SECS,
            max_events: DEFAULT_MAX_EVENTS,
        }
    }

    pub fn with_element(mut self, element: ElementHandle) -> Self {
        self.element = Some(element);
        self
    }

    pub fn with_event_types(mut self, event_types: impl IntoIterator<Item = ObserverEventType>) -> Self {
        self.event_types = event_types.into_iter().collect();
        self
    }

    pub fn with_duration(mut self, duration_secs: u64) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    pub fn validate(&self) -> Result<(), ObserverError> {
        if self.pid <= 0 {
            return Err(ObserverError::InvalidApplication(format!(
                "PID must be positive, got {}",
                self.pid
            )));
        }
        if self.duration_secs > OBSERVE_DURATION_HARD_CAP_SECS {
            return Err(ObserverError::DurationExceeded {
                max: MAX_OBSERVE_DURATION_SECS,
            });
        }
        if self.max_events == 0 || self.max_events > MAX_EVENTS_LIMIT {
            return Err(ObserverError::MaxEventsExceeded {
                limit: MAX_EVENTS_LIMIT,
            });
        }
        Ok(())
    }

    fn notification_types(&self) -> Vec<ObserverEventType> {
        if self.event_types.is_empty() {
            ObserverEventType::ALL.to_vec()
        } else {
            self.event_types.clone()
        }
    }
}

struct SessionEntry {
    pid: i32,
    stop_signal: Arc<AtomicBool>,
}

#[derive(Default)]
struct Registry {
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
}

/// Removes its session from the registry when dropped
struct Registration {
    id: Uuid,
    registry: Arc<Registry>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.registry.sessions.lock().remove(&self.id).is_some() {
            tracing::debug!(target: "ax_mcp::observers", id = %self.id, "session deregistered");
        }
    }
}

/// Starts observation sessions and tracks the live ones
///
/// At most one session runs per process id. Cloning shares the registry.
#[derive(Clone)]
pub struct ObserverManager {
    elements: Arc<dyn AccessibilityBridge>,
    observers: Arc<dyn ObserverBridge>,
    registry: Arc<Registry>,
}

impl ObserverManager {
    pub fn new(elements: Arc<dyn AccessibilityBridge>, observers: Arc<dyn ObserverBridge>) -> Self {
        Self {
            elements,
            observers,
            registry: Arc::new(Registry::default()),
        }
    }

    /// Validate `request`, register it and start its worker
    pub async fn start(&self, request: &ObservationRequest) -> Result<ObservationSession, ObserverError> {
        request.validate()?;

        let id = Uuid::new_v4();
        let stop_signal = Arc::new(AtomicBool::new(false));
        {
            let mut sessions = self.registry.sessions.lock();
            if sessions.values().any(|entry| entry.pid == request.pid) {
                return Err(ObserverError::ObserverAlreadyActive { pid: request.pid });
            }
            sessions.insert(
                id,
                SessionEntry {
                    pid: request.pid,
                    stop_signal: Arc::clone(&stop_signal),
                },
            );
        }
        let registration = Registration {
            id,
            registry: Arc::clone(&self.registry),
        };

        let (worker, receiver) = ObservationWorker::start(
            request.pid,
            request.element,
            &request.notification_types(),
            Arc::clone(&self.elements),
            Arc::clone(&self.observers),
            stop_signal,
        )
        .await?;

        tracing::info!(target: "ax_mcp::observers", %id, pid = request.pid, "observation started");
        Ok(ObservationSession {
            id,
            pid: request.pid,
            worker,
            receiver,
            _registration: registration,
        })
    }

    /// Signal a session's worker to stop; its channel then closes
    pub fn stop(&self, id: Uuid) -> bool {
        match self.registry.sessions.lock().get(&id) {
            Some(entry) => {
                entry.stop_signal.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&self) {
        for entry in self.registry.sessions.lock().values() {
            entry.stop_signal.store(true, Ordering::SeqCst);
        }
    }

    pub fn active_count(&self) -> usize {
        self.registry.sessions.lock().len()
    }

    /// Run a complete observation: start, collect, tear down
    pub async fn observe(&self, request: &ObservationRequest) -> Result<EventCollectionResult, ObserverError> {
        let session = self.start(request).await?;
        Ok(session.collect(request.duration_secs, request.max_events).await)
    }
}

/// One running observation
///
/// Dropping the session stops its worker and deregisters it.
#[derive(Debug)]
pub struct ObservationSession {
    id: Uuid,
    pid: i32,
    worker: ObservationWorker,
    receiver: mpsc::Receiver<ObserverEvent>,
    _registration: Registration,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Registration").field(&self.id).finish()
    }
}

impl ObservationSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn pid(&self) -> i32 {
        self.pid
    }

    /// Collect for the clamped window, then tear the session down
    pub async fn collect(mut self, duration_secs: u64, max_events: usize) -> EventCollectionResult {
        let window = Duration::from_secs(clamp_duration(duration_secs));
        let mut result = collect_events(&mut self.receiver, window, max_events).await;
        self.worker.shutdown().await;
        result.application_terminated = self.worker.is_terminated();
        tracing::info!(
            target: "ax_mcp::observers",
            id = %self.id,
            pid = self.pid,
            events = result.events.len(),
            "observation finished"
        );
        result
    }

    pub fn stop(&mut self) {
        self.worker.stop();
    }
}
