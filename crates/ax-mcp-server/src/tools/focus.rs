//! Focus tool implementation (get_focused_element)

use super::{ToolResult, resolve_app, respond};
use crate::constants::UNLOCATED_FOCUS_PATH;
use crate::context::ServerContext;
use crate::errors::ErrorContext;
use crate::requests::GetFocusedElementRequest;
use ax_mcp_core::{
    AccessibilityBridge, AccessibilityError, Attribute, ElementHandle, ElementInfo, ToolError, locate,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct FocusedElementResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementInfo>,
    pub has_focus: bool,
}

/// Report the element holding keyboard focus, in one app or system-wide
pub async fn get_focused_element(
    context: &ServerContext,
    request: GetFocusedElementRequest,
) -> ToolResult {
    let errors = ErrorContext::new("get_focused_element", request.app.as_deref());
    respond(focused(context, &errors, request.app.as_deref()))
}

fn focused(
    context: &ServerContext,
    errors: &ErrorContext<'_>,
    app: Option<&str>,
) -> Result<FocusedElementResponse, ToolError> {
    let bridge = context.elements.as_ref();

    let (root, pid) = match app {
        Some(app) => {
            let pid = resolve_app(context, errors, app)?;
            let root = bridge.create_app_root(pid).map_err(|e| errors.engine(&e))?;
            (root, Some(pid))
        }
        None => (
            bridge.create_system_root().map_err(|e| errors.engine(&e))?,
            None,
        ),
    };

    let element = match bridge.element_attribute(&Attribute::FocusedUiElement, root) {
        Ok(element) => element,
        Err(AccessibilityError::NoValue) => {
            return Ok(FocusedElementResponse {
                element: None,
                has_focus: false,
            });
        }
        Err(err) => return Err(errors.engine(&err)),
    };

    let path = focus_path(context, element, pid);
    let info = describe(bridge, element, path).map_err(|e| errors.engine(&e))?;
    tracing::info!(target: "ax_mcp::tools", pid, path = %info.path, "get_focused_element");
    Ok(FocusedElementResponse {
        element: Some(info),
        has_focus: true,
    })
}

/// Canonical path of the focused element, or a placeholder when no
/// application contains it
fn focus_path(context: &ServerContext, element: ElementHandle, pid: Option<i32>) -> String {
    let candidates: Vec<i32> = match pid {
        Some(pid) => vec![pid],
        None => context
            .apps
            .running_applications()
            .into_iter()
            .map(|app| app.pid)
            .collect(),
    };
    candidates
        .into_iter()
        .find_map(|pid| locate(element, pid, context.elements.as_ref()).ok())
        .map(|path| path.to_string())
        .unwrap_or_else(|| UNLOCATED_FOCUS_PATH.to_string())
}

fn describe(
    bridge: &dyn AccessibilityBridge,
    element: ElementHandle,
    path: String,
) -> Result<ElementInfo, AccessibilityError> {
    Ok(ElementInfo {
        role: bridge.role(element)?.to_string(),
        title: bridge.string_attribute(&Attribute::Title, element).ok(),
        value: bridge
            .attribute(&Attribute::Value, element)
            .ok()
            .and_then(|value| value.display_value()),
        path,
        actions: bridge
            .action_names(element)?
            .iter()
            .map(ToString::to_string)
            .collect(),
    })
}
