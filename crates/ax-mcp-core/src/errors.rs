//! Error types for the accessibility engine
//!
//! Every error crossing the engine boundary carries a machine-readable kind
//! and, where the caller can act on it, a remediation hint. See
//! [`ErrorGuidance`].

use std::time::Duration;
use thiserror::Error;

/// Kind and remediation hint for an engine error
pub trait ErrorGuidance: std::error::Error {
    /// Machine-readable error kind, stable across releases
    fn error_type(&self) -> &'static str;

    /// What the caller can do about it, if anything
    fn guidance(&self) -> Option<String>;
}

/// Failures reported by the accessibility bridge
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccessibilityError {
    #[error("accessibility operation failed")]
    Failure,

    /// The element handle is stale: the UI changed or the app exited
    #[error("element is no longer valid")]
    InvalidElement,

    #[error("the application could not complete the request")]
    CannotComplete,

    #[error("attribute '{0}' is not supported by this element")]
    AttributeUnsupported(String),

    #[error("action '{0}' is not supported by this element")]
    ActionUnsupported(String),

    #[error("notification '{0}' is not supported by this element")]
    NotificationUnsupported(String),

    #[error("operation not implemented by the accessibility backend")]
    NotImplemented,

    #[error("accessibility API is disabled")]
    ApiDisabled,

    #[error("attribute has no value")]
    NoValue,

    #[error("accessibility permissions not granted")]
    PermissionDenied { guidance: String },

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("attribute '{0}' not found")]
    AttributeNotFound(String),
}

impl AccessibilityError {
    /// Permission error with the standard remediation hint
    pub fn permission_denied() -> Self {
        Self::PermissionDenied {
            guidance: "Grant Accessibility permissions in System Settings > Privacy & Security > Accessibility"
                .to_string(),
        }
    }

    pub fn type_mismatch(expected: &'static str, actual: &'static str) -> Self {
        Self::TypeMismatch { expected, actual }
    }
}

impl ErrorGuidance for AccessibilityError {
    fn error_type(&self) -> &'static str {
        match self {
            Self::PermissionDenied { .. } => "permission_denied",
            Self::InvalidElement => "invalid_element",
            Self::CannotComplete => "cannot_complete",
            Self::ActionUnsupported(_) => "action_not_supported",
            _ => "accessibility_error",
        }
    }

    fn guidance(&self) -> Option<String> {
        let text = match self {
            Self::PermissionDenied { guidance } => return Some(guidance.clone()),
            Self::InvalidElement => {
                "The UI may have changed. Re-run get_ui_tree or find_element to get fresh element paths."
            }
            Self::CannotComplete => {
                "The app may be busy or unresponsive. Check if it is showing a dialog or loading."
            }
            Self::ActionUnsupported(_) => "Check available actions for this element.",
            _ => {
                "Check that the application is running and accessibility permissions are granted."
            }
        };
        Some(text.to_string())
    }
}

/// Failures mapping an app identifier to a process id
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppResolutionError {
    #[error("Application '{app}' is not running")]
    NotRunning { app: String },

    #[error("Multiple apps match '{app}': {}", .matches.join(", "))]
    MultipleMatches { app: String, matches: Vec<String> },

    #[error("Invalid app identifier: '{0}'")]
    InvalidIdentifier(String),
}

impl AppResolutionError {
    pub fn not_running(app: impl Into<String>) -> Self {
        Self::NotRunning { app: app.into() }
    }
}

impl ErrorGuidance for AppResolutionError {
    fn error_type(&self) -> &'static str {
        match self {
            Self::NotRunning { .. } => "app_not_running",
            Self::MultipleMatches { .. } => "multiple_matches",
            Self::InvalidIdentifier(_) => "invalid_identifier",
        }
    }

    fn guidance(&self) -> Option<String> {
        Some(match self {
            Self::NotRunning { .. } => "Start the application and try again. Use the exact app name as it appears in the Dock or Activity Monitor.".to_string(),
            Self::MultipleMatches { matches, .. } => format!(
                "Use a more specific name. Running matches: {}",
                matches.join(", ")
            ),
            Self::InvalidIdentifier(_) => {
                "Provide a valid app name (e.g. \"Finder\") or numeric PID.".to_string()
            }
        })
    }
}

/// Failures parsing or resolving an element path
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error("Invalid element path format: {0}")]
    InvalidFormat(String),

    #[error("Element path is empty")]
    EmptyPath,

    #[error("Element path has {0} components (too long)")]
    PathTooLong(usize),

    #[error("Invalid PID: {0}")]
    InvalidPid(i32),

    #[error("Path component {component} not found. Available: {}", .available.join(", "))]
    ComponentNotFound {
        component: String,
        available: Vec<String>,
    },

    #[error("Element not found at path: {0}")]
    ElementNotFound(String),

    #[error("Stale element reference: {0}")]
    StaleReference(String),

    #[error("Path resolution timed out after {}s", .0.as_secs_f64())]
    TimeoutExceeded(Duration),

    #[error("Accessibility error during path resolution: {0}")]
    Accessibility(#[from] AccessibilityError),
}

impl PathError {
    pub fn invalid_format(detail: impl Into<String>) -> Self {
        Self::InvalidFormat(detail.into())
    }

    pub fn component_not_found(component: impl ToString, available: Vec<String>) -> Self {
        Self::ComponentNotFound {
            component: component.to_string(),
            available,
        }
    }

    /// Classify a bridge failure on an already-resolved element
    pub fn for_element(path: impl ToString, err: AccessibilityError) -> Self {
        match err {
            AccessibilityError::InvalidElement => Self::StaleReference(path.to_string()),
            other => Self::Accessibility(other),
        }
    }
}

impl ErrorGuidance for PathError {
    fn error_type(&self) -> &'static str {
        match self {
            Self::Accessibility(inner) => inner.error_type(),
            _ => "element_path_error",
        }
    }

    fn guidance(&self) -> Option<String> {
        let text = match self {
            Self::Accessibility(inner) => return inner.guidance(),
            Self::StaleReference(_) => {
                "The UI has changed since this path was obtained. Re-run get_ui_tree or find_element to get a fresh path."
            }
            Self::ElementNotFound(_) => {
                "The element may have been removed. Re-run get_ui_tree or find_element to get current paths."
            }
            Self::ComponentNotFound { .. } => {
                "A path segment does not match the current UI. Re-run get_ui_tree to see the current element hierarchy."
            }
            Self::TimeoutExceeded(_) => {
                "The application may be slow. Try again or target a simpler element path."
            }
            _ => "Check the element path syntax. Paths are returned by get_ui_tree and find_element.",
        };
        Some(text.to_string())
    }
}

/// Failures while snapshotting an element tree
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TraversalError {
    #[error("Invalid depth: {0}")]
    InvalidDepth(usize),

    #[error("Traversal exceeded {}s timeout", .0.as_secs_f64())]
    TimeoutExceeded(Duration),

    #[error("Accessibility error during traversal: {0}")]
    Accessibility(#[from] AccessibilityError),

    /// A child was excluded by the role filter; never escapes the traverser
    #[error("Element excluded from traversal")]
    InvalidElement,
}

impl ErrorGuidance for TraversalError {
    fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidDepth(_) => "invalid_parameter",
            Self::TimeoutExceeded(_) => "timeout",
            Self::Accessibility(inner) => inner.error_type(),
            Self::InvalidElement => "traversal_error",
        }
    }

    fn guidance(&self) -> Option<String> {
        let text = match self {
            Self::InvalidDepth(_) => "Depth must be at least 1. Default is 3.",
            Self::TimeoutExceeded(_) => {
                "Reduce the depth parameter or use find_element with specific criteria."
            }
            Self::Accessibility(inner) => return inner.guidance(),
            Self::InvalidElement => return None,
        };
        Some(text.to_string())
    }
}

/// Failures in the observation pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObserverError {
    #[error("Invalid application: {0}")]
    InvalidApplication(String),

    #[error("Failed to create observer: {0}")]
    ObserverCreationFailed(String),

    #[error("Duration exceeds maximum of {max}s")]
    DurationExceeded { max: u64 },

    #[error("Application (PID {pid}) terminated")]
    ApplicationTerminated { pid: i32 },

    #[error("Event limit of {limit} reached")]
    MaxEventsExceeded { limit: usize },

    #[error("Observer already active for PID {pid}")]
    ObserverAlreadyActive { pid: i32 },
}

impl ErrorGuidance for ObserverError {
    fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidApplication(_) => "invalid_application",
            Self::ObserverCreationFailed(_) => "observer_creation_failed",
            Self::DurationExceeded { .. } => "duration_exceeded",
            Self::ApplicationTerminated { .. } => "application_terminated",
            Self::MaxEventsExceeded { .. } => "max_events_exceeded",
            Self::ObserverAlreadyActive { .. } => "observer_already_active",
        }
    }

    fn guidance(&self) -> Option<String> {
        let text = match self {
            Self::InvalidApplication(_) => "Check the application name or PID.".to_string(),
            Self::ObserverCreationFailed(_) => {
                "Ensure accessibility permissions are granted.".to_string()
            }
            Self::DurationExceeded { max } => {
                format!("Request a duration between 1 and {max} seconds.")
            }
            Self::ApplicationTerminated { .. } => {
                "Application quit during observation. Restart it and observe again.".to_string()
            }
            Self::MaxEventsExceeded { limit } => {
                format!("Request at most {limit} events or observe a narrower element.")
            }
            Self::ObserverAlreadyActive { .. } => {
                "Wait for the running observation on this application to finish.".to_string()
            }
        };
        Some(text)
    }
}

/// Rejection of a write operation on a protected application
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlocklistError {
    #[error("Application '{app}' is blocklisted for write operations")]
    BlockedApplication { app: String, bundle_id: String },
}

impl ErrorGuidance for BlocklistError {
    fn error_type(&self) -> &'static str {
        "blocklisted_application"
    }

    fn guidance(&self) -> Option<String> {
        match self {
            Self::BlockedApplication { bundle_id, .. } => Some(format!(
                "Bundle ID '{bundle_id}' is on the write blocklist. Read operations are still permitted."
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_not_found_lists_alternatives() {
        let err = PathError::component_not_found(
            "window[\"Doc2\"]",
            vec!["Doc1".to_string(), "Inbox".to_string()],
        );
        assert_eq!(
            err.to_string(),
            "Path component window[\"Doc2\"] not found. Available: Doc1, Inbox"
        );
        assert_eq!(err.error_type(), "element_path_error");
        assert!(err.guidance().unwrap().contains("get_ui_tree"));
    }

    #[test]
    fn test_path_error_delegates_accessibility_kind() {
        let err = PathError::from(AccessibilityError::permission_denied());
        assert_eq!(err.error_type(), "permission_denied");
        assert!(err.guidance().unwrap().contains("System Settings"));
    }

    #[test]
    fn test_for_element_marks_stale_handles() {
        let err = PathError::for_element("app(1)/AXButton[0]", AccessibilityError::InvalidElement);
        assert_eq!(err, PathError::StaleReference("app(1)/AXButton[0]".to_string()));

        let err = PathError::for_element("app(1)", AccessibilityError::CannotComplete);
        assert_eq!(err, PathError::Accessibility(AccessibilityError::CannotComplete));
    }

    #[test]
    fn test_timeout_messages() {
        let err = TraversalError::TimeoutExceeded(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "Traversal exceeded 1.5s timeout");
        assert_eq!(err.error_type(), "timeout");

        let err = PathError::TimeoutExceeded(Duration::from_secs(5));
        assert_eq!(err.to_string(), "Path resolution timed out after 5s");
    }

    #[test]
    fn test_invalid_depth_guidance() {
        let err = TraversalError::InvalidDepth(0);
        assert_eq!(err.error_type(), "invalid_parameter");
        assert_eq!(
            err.guidance().as_deref(),
            Some("Depth must be at least 1. Default is 3.")
        );
    }

    #[test]
    fn test_app_resolution_messages() {
        let err = AppResolutionError::MultipleMatches {
            app: "Code".to_string(),
            matches: vec!["Code".to_string(), "Code Helper".to_string()],
        };
        assert_eq!(err.to_string(), "Multiple apps match 'Code': Code, Code Helper");
        assert!(err.guidance().unwrap().contains("Code Helper"));
        assert_eq!(
            AppResolutionError::not_running("Mail").error_type(),
            "app_not_running"
        );
    }

    #[test]
    fn test_observer_error_kinds() {
        let cases = [
            (ObserverError::InvalidApplication("pid 0".into()), "invalid_application"),
            (ObserverError::ObserverCreationFailed("denied".into()), "observer_creation_failed"),
            (ObserverError::DurationExceeded { max: 300 }, "duration_exceeded"),
            (ObserverError::ApplicationTerminated { pid: 7 }, "application_terminated"),
            (ObserverError::MaxEventsExceeded { limit: 10 }, "max_events_exceeded"),
            (ObserverError::ObserverAlreadyActive { pid: 7 }, "observer_already_active"),
        ];
        for (err, kind) in cases {
            assert_eq!(err.error_type(), kind);
            assert!(err.guidance().is_some(), "{kind} should carry guidance");
        }
        assert_eq!(
            ObserverError::ApplicationTerminated { pid: 42 }.to_string(),
            "Application (PID 42) terminated"
        );
    }

    #[test]
    fn test_blocklist_guidance_names_bundle() {
        let err = BlocklistError::BlockedApplication {
            app: "Terminal".to_string(),
            bundle_id: "com.apple.Terminal".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Application 'Terminal' is blocklisted for write operations"
        );
        let guidance = err.guidance().unwrap();
        assert!(guidance.contains("com.apple.Terminal"));
        assert!(guidance.contains("Read operations are still permitted"));
    }
}
