//! Error records returned by the MCP tools
//!
//! Engine errors never cross the tool boundary as Rust errors. Each one is
//! turned into a [`ToolError`] record naming the failed operation, the error
//! kind and a remediation hint.

use crate::constants::{PARAMETER_GUIDANCE, READ_ONLY_GUIDANCE};
use ax_mcp_core::{AppResolutionError, ErrorGuidance, ToolError};
use thiserror::Error;

/// Tool arguments that fail validation before any engine call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("missing required parameter '{0}'")]
    MissingRequired(&'static str),

    #[error("invalid value '{value}' for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        value: String,
        reason: String,
    },
}

impl ParameterError {
    pub fn invalid_value(
        parameter: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            parameter,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Builds [`ToolError`] records for one tool invocation
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext<'a> {
    operation: &'static str,
    app: Option<&'a str>,
}

impl<'a> ErrorContext<'a> {
    pub fn new(operation: &'static str, app: Option<&'a str>) -> Self {
        Self { operation, app }
    }

    /// Record for any engine error that knows its kind and guidance
    pub fn engine(&self, err: &impl ErrorGuidance) -> ToolError {
        let record = ToolError::new(self.operation, err.error_type(), err.to_string())
            .with_app(self.app);
        match err.guidance() {
            Some(guidance) => record.with_guidance(guidance),
            None => record,
        }
    }

    /// App resolution failures name the identifier only when it was usable
    pub fn app_resolution(&self, err: &AppResolutionError) -> ToolError {
        let app = match err {
            AppResolutionError::NotRunning { app } | AppResolutionError::MultipleMatches { app, .. } => {
                Some(app.as_str())
            }
            AppResolutionError::InvalidIdentifier(_) => None,
        };
        let record = ToolError::new(self.operation, err.error_type(), err.to_string()).with_app(app);
        match err.guidance() {
            Some(guidance) => record.with_guidance(guidance),
            None => record,
        }
    }

    pub fn parameter(&self, err: &ParameterError) -> ToolError {
        ToolError::new(
            self.operation,
            "invalid_parameter",
            format!("Invalid parameter: {err}"),
        )
        .with_guidance(PARAMETER_GUIDANCE)
    }

    pub fn read_only(&self) -> ToolError {
        ToolError::new(
            self.operation,
            "read_only_mode",
            "Write operations are disabled in read-only mode",
        )
        .with_app(self.app)
        .with_guidance(READ_ONLY_GUIDANCE)
    }

    /// The element path names a different application than `app`
    pub fn path_app_mismatch(&self, path_pid: i32, app_pid: i32) -> ToolError {
        ToolError::new(
            self.operation,
            "element_path_error",
            format!(
                "Element path targets app({path_pid}) but '{}' resolved to PID {app_pid}",
                self.app.unwrap_or_default()
            ),
        )
        .with_app(self.app)
        .with_guidance("Use an element path obtained for this application from get_ui_tree or find_element.")
    }

    /// A blocking task behind the tool panicked or was cancelled
    pub fn internal(&self, detail: impl std::fmt::Display) -> ToolError {
        ToolError::new(self.operation, "internal_error", format!("Internal error: {detail}"))
            .with_app(self.app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ax_mcp_core::{AccessibilityError, BlocklistError, ObserverError, PathError};

    #[test]
    fn test_engine_errors_keep_kind_and_guidance() {
        let ctx = ErrorContext::new("perform_action", Some("TextEdit"));

        let err = ctx.engine(&AccessibilityError::permission_denied());
        assert_eq!(err.operation, "perform_action");
        assert_eq!(err.error_type, "permission_denied");
        assert_eq!(err.app.as_deref(), Some("TextEdit"));
        assert!(err.guidance.unwrap().contains("Privacy & Security"));

        let err = ctx.engine(&PathError::StaleReference("app(1)/AXButton[0]".into()));
        assert_eq!(err.error_type, "element_path_error");
        assert_eq!(err.message, "Stale element reference: app(1)/AXButton[0]");

        let err = ctx.engine(&BlocklistError::BlockedApplication {
            app: "Terminal".into(),
            bundle_id: "com.apple.Terminal".into(),
        });
        assert_eq!(err.error_type, "blocklisted_application");

        let err = ctx.engine(&ObserverError::DurationExceeded { max: 300 });
        assert_eq!(err.error_type, "duration_exceeded");
    }

    #[test]
    fn test_invalid_identifier_omits_app() {
        let ctx = ErrorContext::new("get_ui_tree", Some("  "));
        let err = ctx.app_resolution(&AppResolutionError::InvalidIdentifier("  ".into()));
        assert_eq!(err.error_type, "invalid_identifier");
        assert_eq!(err.app, None);

        let err = ctx.app_resolution(&AppResolutionError::not_running("Mail"));
        assert_eq!(err.error_type, "app_not_running");
        assert_eq!(err.app.as_deref(), Some("Mail"));
    }

    #[test]
    fn test_parameter_and_read_only_records() {
        let ctx = ErrorContext::new("perform_action", Some("Safari"));
        let err = ctx.parameter(&ParameterError::invalid_value(
            "action",
            "AXZoom",
            "Must be one of: AXPress",
        ));
        assert_eq!(err.error_type, "invalid_parameter");
        assert_eq!(
            err.message,
            "Invalid parameter: invalid value 'AXZoom' for 'action': Must be one of: AXPress"
        );
        assert_eq!(err.app, None);

        let err = ctx.read_only();
        assert_eq!(err.error_type, "read_only_mode");
        assert_eq!(err.app.as_deref(), Some("Safari"));
        assert!(err.guidance.unwrap().contains("--read-only"));
    }

    #[test]
    fn test_path_mismatch_names_both_pids() {
        let err = ErrorContext::new("set_value", Some("Notes")).path_app_mismatch(7, 42);
        assert_eq!(err.error_type, "element_path_error");
        assert!(err.message.contains("app(7)"));
        assert!(err.message.contains("PID 42"));
    }
}
