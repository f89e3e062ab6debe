//! Dedicated thread driving one native notification subscription

use crate::bridge::{
    AccessibilityBridge, Attribute, ElementHandle, Notification, NotificationCallback,
    ObserverBridge, PumpStatus, RawNotification,
};
use crate::constants::{OBSERVER_CHANNEL_CAPACITY, OBSERVER_PUMP_INTERVAL};
use crate::errors::{AccessibilityError, ObserverError};
use crate::path::locate;
use ax_mcp_protocol::{ObserverEvent, ObserverEventType};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

/// Owns the worker thread of one observation session
///
/// The thread subscribes, pumps the bridge until told to stop or the target
/// goes away, then unsubscribes. The subscription callback holds the only
/// sender, so the event channel closes once the thread has unsubscribed.
pub struct ObservationWorker {
    pid: i32,
    stop_signal: Arc<AtomicBool>,
    terminated: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ObservationWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservationWorker")
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

impl ObservationWorker {
    /// Spawn the worker and wait until its subscription is in place
    pub async fn start(
        pid: i32,
        element: Option<ElementHandle>,
        event_types: &[ObserverEventType],
        elements: Arc<dyn AccessibilityBridge>,
        observers: Arc<dyn ObserverBridge>,
        stop_signal: Arc<AtomicBool>,
    ) -> Result<(Self, mpsc::Receiver<ObserverEvent>), ObserverError> {
        let (tx, rx) = mpsc::channel(OBSERVER_CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), AccessibilityError>>();
        let notifications: Vec<Notification> = event_types
            .iter()
            .map(|t| Notification::from(t.notification_name()))
            .collect();
        let terminated = Arc::new(AtomicBool::new(false));

        let thread = {
            let stop_signal = Arc::clone(&stop_signal);
            let terminated = Arc::clone(&terminated);
            std::thread::Builder::new()
                .name(format!("ax-observer-{pid}"))
                .spawn(move || {
                    let callback: NotificationCallback = Arc::new(move |raw: RawNotification| {
                        let Some(event) = translate(&raw, pid, elements.as_ref()) else {
                            return;
                        };
                        match tx.try_send(event) {
                            Ok(()) | Err(TrySendError::Closed(_)) => {}
                            Err(TrySendError::Full(_)) => {
                                tracing::debug!(
                                    target: "ax_mcp::observers",
                                    pid,
                                    "event channel full, dropping event"
                                );
                            }
                        }
                    });

                    let session = match observers.subscribe(pid, element, &notifications, callback)
                    {
                        Ok(session) => {
                            let _ = ready_tx.send(Ok(()));
                            session
                        }
                        Err(err) => {
                            let _ = ready_tx.send(Err(err));
                            return;
                        }
                    };

                    while !stop_signal.load(Ordering::SeqCst) {
                        if observers.pump(session, OBSERVER_PUMP_INTERVAL) == PumpStatus::Terminated {
                            terminated.store(true, Ordering::SeqCst);
                            tracing::info!(target: "ax_mcp::observers", pid, "observed application terminated");
                            break;
                        }
                    }
                    observers.unsubscribe(session);
                    tracing::debug!(target: "ax_mcp::observers", pid, "observation worker exiting");
                })
                .map_err(|e| ObserverError::ObserverCreationFailed(e.to_string()))?
        };

        let mut worker = Self {
            pid,
            stop_signal,
            terminated,
            thread: Some(thread),
        };

        // A dropped sender means the thread died before subscribing
        let ready = ready_rx
            .await
            .unwrap_or(Err(AccessibilityError::Failure));
        match ready {
            Ok(()) => {
                tracing::debug!(target: "ax_mcp::observers", pid, "observation worker started");
                Ok((worker, rx))
            }
            Err(err) => {
                worker.stop();
                Err(match err {
                    AccessibilityError::InvalidElement => ObserverError::ApplicationTerminated { pid },
                    other => ObserverError::ObserverCreationFailed(other.to_string()),
                })
            }
        }
    }

    /// Whether the bridge reported the target process gone
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Signal the thread and wait for it to unsubscribe and exit
    ///
    /// Blocks the calling thread for at most one pump interval. Async callers
    /// use [`ObservationWorker::shutdown`].
    pub fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        let Some(thread) = self.thread.take() else {
            return;
        };
        if thread.join().is_err() {
            tracing::warn!(target: "ax_mcp::observers", pid = self.pid, "observation worker panicked");
        }
    }

    /// Like [`ObservationWorker::stop`], joining on the blocking pool
    pub async fn shutdown(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        let Some(thread) = self.thread.take() else {
            return;
        };
        let joined = tokio::task::spawn_blocking(move || thread.join()).await;
        if !matches!(joined, Ok(Ok(()))) {
            tracing::warn!(target: "ax_mcp::observers", pid = self.pid, "observation worker panicked");
        }
    }
}

impl Drop for ObservationWorker {
    // Sessions dropped mid-collection still unsubscribe before the drop returns
    fn drop(&mut self) {
        self.stop();
    }
}

fn translate(
    raw: &RawNotification,
    pid: i32,
    bridge: &dyn AccessibilityBridge,
) -> Option<ObserverEvent> {
    let event_type = ObserverEventType::from_notification_name(raw.name.as_str())?;
    let mut event = ObserverEvent::now(event_type);
    if let Some(element) = raw.element {
        // Destroyed windows are already detached and have no path
        event.element_path = locate(element, pid, bridge).ok().map(|path| path.to_string());
        event.element_role = bridge.role(element).ok().map(|role| role.to_string());
        event.element_title = bridge.string_attribute(&Attribute::Title, element).ok();
        if event_type == ObserverEventType::ValueChanged {
            event.new_value = bridge
                .attribute(&Attribute::Value, element)
                .ok()
                .and_then(|value| value.display_value());
        }
    }
    Some(event)
}
