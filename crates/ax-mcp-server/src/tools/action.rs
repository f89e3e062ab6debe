//! Action tool implementation (perform_action)

use super::write::{WriteTarget, prepare, read_state};
use super::{ToolResult, require, respond};
use crate::context::ServerContext;
use crate::errors::{ErrorContext, ParameterError};
use crate::requests::PerformActionRequest;
use ax_mcp_core::{Action, ElementStateInfo, PathError, ToolError};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PerformActionResponse {
    pub success: bool,
    pub action: String,
    pub element_state: ElementStateInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_warning: Option<String>,
}

/// Perform one of the permitted actions on an element
pub async fn perform_action(context: &ServerContext, request: PerformActionRequest) -> ToolResult {
    let errors = ErrorContext::new("perform_action", Some(request.app.as_str()));
    respond(act(context, &errors, &request).await)
}

fn permitted_action(name: &str) -> Result<Action, ParameterError> {
    require("action", name)?;
    let action = Action::from(name);
    if !Action::PERMITTED.contains(&action) {
        let allowed: Vec<&str> = Action::PERMITTED.iter().map(Action::as_str).collect();
        return Err(ParameterError::invalid_value(
            "action",
            name,
            format!("Must be one of: {}", allowed.join(", ")),
        ));
    }
    Ok(action)
}

async fn act(
    context: &ServerContext,
    errors: &ErrorContext<'_>,
    request: &PerformActionRequest,
) -> Result<PerformActionResponse, ToolError> {
    require("app", &request.app).map_err(|e| errors.parameter(&e))?;
    require("element_path", &request.element_path).map_err(|e| errors.parameter(&e))?;
    let action = permitted_action(&request.action).map_err(|e| errors.parameter(&e))?;

    let WriteTarget {
        pid,
        element,
        path,
        rate_limit,
    } = prepare(context, errors, &request.app, &request.element_path).await?;

    context
        .elements
        .perform_action(&action, element)
        .map_err(|e| errors.engine(&PathError::for_element(&path, e)))?;

    tracing::info!(
        target: "ax_mcp::tools",
        pid,
        %action,
        path = %path,
        "perform_action"
    );
    Ok(PerformActionResponse {
        success: true,
        action: action.to_string(),
        element_state: read_state(context, element, &path),
        rate_limit_warning: rate_limit.warning_message(),
    })
}
