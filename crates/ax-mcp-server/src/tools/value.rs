//! Value tool implementation (set_value)

use super::write::{WriteTarget, prepare, read_state};
use super::{ToolResult, require, respond};
use crate::context::ServerContext;
use crate::errors::ErrorContext;
use crate::requests::{ScalarValue, SetValueRequest};
use ax_mcp_core::{Attribute, AttributeValue, ElementStateInfo, PathError, ToolError};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SetValueResponse {
    pub success: bool,
    pub previous_value: Option<String>,
    pub new_value: Option<String>,
    pub element_state: ElementStateInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_warning: Option<String>,
}

impl From<&ScalarValue> for AttributeValue {
    fn from(value: &ScalarValue) -> Self {
        match value {
            ScalarValue::Bool(b) => AttributeValue::Bool(*b),
            ScalarValue::Int(i) => AttributeValue::Int(*i),
            ScalarValue::Float(f) => AttributeValue::Float(*f),
            ScalarValue::Text(s) => AttributeValue::String(s.clone()),
        }
    }
}

/// Write an element's value attribute
pub async fn set_value(context: &ServerContext, request: SetValueRequest) -> ToolResult {
    let errors = ErrorContext::new("set_value", Some(request.app.as_str()));
    respond(write_value(context, &errors, &request).await)
}

async fn write_value(
    context: &ServerContext,
    errors: &ErrorContext<'_>,
    request: &SetValueRequest,
) -> Result<SetValueResponse, ToolError> {
    require("app", &request.app).map_err(|e| errors.parameter(&e))?;
    require("element_path", &request.element_path).map_err(|e| errors.parameter(&e))?;

    let WriteTarget {
        pid,
        element,
        path,
        rate_limit,
    } = prepare(context, errors, &request.app, &request.element_path).await?;

    let bridge = context.elements.as_ref();
    let previous_value = bridge
        .attribute(&Attribute::Value, element)
        .ok()
        .and_then(|value| value.display_value());

    bridge
        .set_attribute(&Attribute::Value, AttributeValue::from(&request.value), element)
        .map_err(|e| errors.engine(&PathError::for_element(&path, e)))?;

    let element_state = read_state(context, element, &path);
    tracing::info!(target: "ax_mcp::tools", pid, path = %path, "set_value");
    Ok(SetValueResponse {
        success: true,
        previous_value,
        new_value: element_state.value.clone(),
        element_state,
        rate_limit_warning: rate_limit.warning_message(),
    })
}
