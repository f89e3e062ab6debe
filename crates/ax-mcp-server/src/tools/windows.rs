//! Window listing tool implementation (list_windows)

use super::{ToolResult, resolve_app, respond};
use crate::constants::DEFAULT_INCLUDE_MINIMIZED;
use crate::context::ServerContext;
use crate::errors::ErrorContext;
use crate::requests::ListWindowsRequest;
use ax_mcp_core::constants::MAX_PATH_COMPONENTS;
use ax_mcp_core::{
    AccessibilityBridge, AccessibilityError, Attribute, ElementHandle, ToolError, WindowInfo,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ListWindowsResponse {
    pub windows: Vec<WindowInfo>,
}

/// List the windows of one application, or of every running one
pub async fn list_windows(context: &ServerContext, request: ListWindowsRequest) -> ToolResult {
    let errors = ErrorContext::new("list_windows", request.app.as_deref());
    respond(windows(context, &errors, &request))
}

fn windows(
    context: &ServerContext,
    errors: &ErrorContext<'_>,
    request: &ListWindowsRequest,
) -> Result<ListWindowsResponse, ToolError> {
    let bridge = context.elements.as_ref();
    let include_minimized = request.include_minimized.unwrap_or(DEFAULT_INCLUDE_MINIMIZED);
    let focused = system_focus(bridge);

    let mut windows = match &request.app {
        Some(app) => {
            let pid = resolve_app(context, errors, app)?;
            app_windows(bridge, pid, app, focused).map_err(|e| errors.engine(&e))?
        }
        None => {
            let mut all = Vec::new();
            for app in context.apps.running_applications() {
                match app_windows(bridge, app.pid, &app.name, focused) {
                    Ok(found) => all.extend(found),
                    Err(err) => tracing::debug!(
                        target: "ax_mcp::tools",
                        pid = app.pid,
                        error = %err,
                        "skipping application windows"
                    ),
                }
            }
            all
        }
    };

    if !include_minimized {
        windows.retain(|window| !window.minimized);
    }
    tracing::info!(target: "ax_mcp::tools", count = windows.len(), "list_windows");
    Ok(ListWindowsResponse { windows })
}

fn system_focus(bridge: &dyn AccessibilityBridge) -> Option<ElementHandle> {
    let system = bridge.create_system_root().ok()?;
    bridge
        .element_attribute(&Attribute::FocusedUiElement, system)
        .ok()
}

fn app_windows(
    bridge: &dyn AccessibilityBridge,
    pid: i32,
    label: &str,
    focused: Option<ElementHandle>,
) -> Result<Vec<WindowInfo>, AccessibilityError> {
    let root = bridge.create_app_root(pid)?;
    let windows = bridge.windows(root)?;
    Ok(windows
        .into_iter()
        .map(|window| WindowInfo {
            title: bridge.string_attribute(&Attribute::Title, window).ok(),
            position: bridge
                .attribute(&Attribute::Position, window)
                .and_then(|value| value.as_point())
                .unwrap_or_default(),
            size: bridge
                .attribute(&Attribute::Size, window)
                .and_then(|value| value.as_size())
                .unwrap_or_default(),
            minimized: bridge
                .bool_attribute(&Attribute::Minimized, window)
                .unwrap_or(false),
            frontmost: focused.is_some_and(|element| contains(bridge, window, element)),
            app: label.to_string(),
        })
        .collect())
}

/// Whether `element` is `window` or one of its descendants
fn contains(bridge: &dyn AccessibilityBridge, window: ElementHandle, element: ElementHandle) -> bool {
    let mut current = element;
    for _ in 0..=MAX_PATH_COMPONENTS {
        if current == window {
            return true;
        }
        match bridge.element_attribute(&Attribute::Parent, current) {
            Ok(parent) => current = parent,
            Err(_) => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{context, parse};
    use ax_mcp_core::{Action, ElementPath, resolve};

    fn request(app: Option<&str>, include_minimized: Option<bool>) -> ListWindowsRequest {
        ListWindowsRequest {
            app: app.map(str::to_string),
            include_minimized,
        }
    }

    #[tokio::test]
    async fn test_app_windows() {
        let (_, context) = context();
        let value = parse(&list_windows(&context, request(Some("com.apple.TextEdit"), None)).await);
        let windows = value["windows"].as_array().unwrap();
        assert_eq!(windows.len(), 2);

        let untitled = &windows[0];
        assert_eq!(untitled["title"], "Untitled");
        assert_eq!(untitled["position"], serde_json::json!({"x": 10.0, "y": 20.0}));
        assert_eq!(untitled["size"], serde_json::json!({"width": 640.0, "height": 480.0}));
        assert_eq!(untitled["minimized"], false);
        assert_eq!(untitled["frontmost"], false);
        assert_eq!(untitled["app"], "com.apple.TextEdit");

        assert_eq!(windows[1]["title"], "Notes.txt");
        assert_eq!(windows[1]["minimized"], true);
        assert_eq!(windows[1]["size"], serde_json::json!({"width": 0.0, "height": 0.0}));
    }

    #[tokio::test]
    async fn test_exclude_minimized() {
        let (_, context) = context();
        let value = parse(&list_windows(&context, request(Some("TextEdit"), Some(false))).await);
        let windows = value["windows"].as_array().unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0]["title"], "Untitled");
    }

    #[tokio::test]
    async fn test_all_applications_and_frontmost() {
        let (desktop, context) = context();
        let close = resolve(
            &ElementPath::parse("app(4200)/window[0]/AXButton[0]").unwrap(),
            desktop.as_ref(),
            None,
        )
        .unwrap();
        desktop.perform_action(&Action::Press, close).unwrap();

        let value = parse(&list_windows(&context, request(None, None)).await);
        let windows = value["windows"].as_array().unwrap();
        assert_eq!(windows.len(), 3);
        let bash = windows.iter().find(|w| w["title"] == "bash").unwrap();
        assert_eq!(bash["app"], "Terminal");
        assert_eq!(bash["frontmost"], true);
        assert!(
            windows
                .iter()
                .filter(|w| w["app"] == "TextEdit")
                .all(|w| w["frontmost"] == false)
        );
    }

    #[tokio::test]
    async fn test_unknown_app() {
        let (_, context) = context();
        let value = parse(&list_windows(&context, request(Some("Mail"), None)).await);
        assert_eq!(value["error_type"], "app_not_running");
        assert_eq!(value["operation"], "list_windows");
    }
}
