//! Observation tool implementation (observe_changes)

use super::{ToolResult, element_path_for, require, resolve_app, resolve_element, respond};
use crate::context::ServerContext;
use crate::errors::{ErrorContext, ParameterError};
use crate::requests::ObserveChangesRequest;
use ax_mcp_core::constants::DEFAULT_OBSERVE_DURATION_SECS;
use ax_mcp_core::observer::clamp_duration;
use ax_mcp_core::{ObservationRequest, ObserverEvent, ObserverEventType, ToolError};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ObserveChangesResponse {
    pub events: Vec<ObserverEvent>,
    pub total_events_collected: usize,
    pub events_returned: usize,
    pub truncated: bool,
    pub duration_requested: u64,
    pub duration_actual: f64,
    pub application_terminated: bool,
    pub notes: Vec<String>,
}

/// Watch an application for UI changes over a time window
pub async fn observe_changes(context: &ServerContext, request: ObserveChangesRequest) -> ToolResult {
    let errors = ErrorContext::new("observe_changes", Some(request.app.as_str()));
    respond(observe(context, &errors, &request).await)
}

fn event_types(names: Option<&[String]>) -> Result<Vec<ObserverEventType>, ParameterError> {
    let Some(names) = names else {
        return Ok(ObserverEventType::ALL.to_vec());
    };
    names
        .iter()
        .map(|name| {
            ObserverEventType::from_name(name).ok_or_else(|| {
                ParameterError::invalid_value(
                    "events",
                    name,
                    format!("Unknown event type. Valid: {}", ObserverEventType::valid_names()),
                )
            })
        })
        .collect()
}

async fn observe(
    context: &ServerContext,
    errors: &ErrorContext<'_>,
    request: &ObserveChangesRequest,
) -> Result<ObserveChangesResponse, ToolError> {
    require("app", &request.app).map_err(|e| errors.parameter(&e))?;
    let types = event_types(request.events.as_deref()).map_err(|e| errors.parameter(&e))?;

    let pid = resolve_app(context, errors, &request.app)?;
    let mut observation = ObservationRequest::new(pid).with_event_types(types);
    if let Some(raw) = &request.element_path {
        let path = element_path_for(context, errors, raw, pid)?;
        observation = observation.with_element(resolve_element(context, errors, &path)?);
    }

    let requested = request.duration.unwrap_or(DEFAULT_OBSERVE_DURATION_SECS as i64);
    let raw_duration = u64::try_from(requested).unwrap_or(0);
    let effective = clamp_duration(raw_duration);
    let was_clamped = !u64::try_from(requested).is_ok_and(|secs| secs == effective);
    observation = observation.with_duration(raw_duration);

    let result = context
        .observers
        .observe(&observation)
        .await
        .map_err(|e| errors.engine(&e))?;

    let mut notes = Vec::new();
    if result.truncated {
        notes.push(format!("Events truncated at {} limit", observation.max_events));
    }
    if was_clamped {
        notes.push(format!("Duration clamped to {effective}s"));
    }

    tracing::info!(
        target: "ax_mcp::tools",
        pid,
        events = result.events.len(),
        terminated = result.application_terminated,
        "observe_changes"
    );
    Ok(ObserveChangesResponse {
        total_events_collected: result.events.len(),
        events_returned: result.events.len(),
        truncated: result.truncated,
        duration_requested: effective,
        duration_actual: result.actual_duration.as_secs_f64(),
        application_terminated: result.application_terminated,
        notes,
        events: result.events,
    })
}
