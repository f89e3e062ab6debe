//! MCP tool implementations
//!
//! This module contains the actual implementation logic for MCP tools.
//! The main.rs file contains thin wrappers that delegate to these implementations.

pub mod action;
pub mod basic;
pub mod find;
pub mod focus;
pub mod observe;
pub mod tree;
pub mod value;
pub mod windows;
mod write;

use crate::context::ServerContext;
use crate::errors::{ErrorContext, ParameterError};
use ax_mcp_core::{ElementHandle, ElementPath, PathComponent, PathError, ToolError, resolve};
use serde::Serialize;
use serde_json::json;

/// Common result type for tool implementations
pub type ToolResult = String;

/// Serialize a tool outcome; failures become their error record
pub fn respond<T: Serialize>(result: Result<T, ToolError>) -> ToolResult {
    let serialized = match &result {
        Ok(response) => serde_json::to_string_pretty(response),
        Err(err) => {
            tracing::warn!(
                target: "ax_mcp::tools",
                operation = %err.operation,
                error_type = %err.error_type,
                app = err.app.as_deref(),
                "{}",
                err.message
            );
            serde_json::to_string_pretty(err)
        }
    };
    serialized.unwrap_or_else(|e| {
        error_response(
            "serialization_error",
            format!("Failed to serialize response: {e}"),
        )
    })
}

/// Helper to create an error JSON response outside the engine taxonomy
pub fn error_response(error_type: &str, message: impl Into<String>) -> ToolResult {
    json!({
        "error_type": error_type,
        "message": message.into()
    })
    .to_string()
}

/// Reject an empty required string parameter
fn require(parameter: &'static str, value: &str) -> Result<(), ParameterError> {
    if value.trim().is_empty() {
        return Err(ParameterError::MissingRequired(parameter));
    }
    Ok(())
}

/// Map an app identifier to its pid
fn resolve_app(context: &ServerContext, errors: &ErrorContext, app: &str) -> Result<i32, ToolError> {
    context
        .apps
        .resolve(app)
        .map_err(|e| errors.app_resolution(&e))
}

/// Parse `raw` and check that it addresses the application `pid`
///
/// A leading `app("<name>")` is resolved through the app resolver and the
/// returned path always starts with the numeric form.
fn element_path_for(
    context: &ServerContext,
    errors: &ErrorContext,
    raw: &str,
    pid: i32,
) -> Result<ElementPath, ToolError> {
    let path = ElementPath::parse(raw).map_err(|e| errors.engine(&e))?;
    path.validate().map_err(|e| errors.engine(&e))?;

    let (first, rest) = path
        .components()
        .split_first()
        .ok_or_else(|| errors.engine(&PathError::EmptyPath))?;
    let path_pid = match first {
        PathComponent::AppByPid(path_pid) => *path_pid,
        PathComponent::AppByName(name) => resolve_app(context, errors, name)?,
        _ => {
            return Err(errors.engine(&PathError::invalid_format(
                "First component must be app",
            )));
        }
    };
    if path_pid != pid {
        return Err(errors.path_app_mismatch(path_pid, pid));
    }

    let mut components = Vec::with_capacity(path.len());
    components.push(PathComponent::AppByPid(pid));
    components.extend(rest.iter().cloned());
    Ok(ElementPath::new(components))
}

fn resolve_element(
    context: &ServerContext,
    errors: &ErrorContext,
    path: &ElementPath,
) -> Result<ElementHandle, ToolError> {
    resolve(path, context.elements.as_ref(), None).map_err(|e| errors.engine(&e))
}
