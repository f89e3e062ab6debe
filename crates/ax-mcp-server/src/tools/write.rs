//! Safety checks and state read-back shared by the write tools

use super::{element_path_for, require, resolve_app, resolve_element};
use crate::context::ServerContext;
use crate::errors::ErrorContext;
use ax_mcp_core::{Attribute, ElementHandle, ElementPath, ElementStateInfo, RateLimitResult, ToolError};

/// A write target that passed every safety check
#[derive(Debug)]
pub(super) struct WriteTarget {
    pub pid: i32,
    pub element: ElementHandle,
    pub path: ElementPath,
    pub rate_limit: RateLimitResult,
}

/// Run the checks every write goes through, in order: parameters, read-only
/// mode, app resolution, blocklist, rate limit, element path
pub(super) async fn prepare(
    context: &ServerContext,
    errors: &ErrorContext<'_>,
    app: &str,
    element_path: &str,
) -> Result<WriteTarget, ToolError> {
    require("app", app).map_err(|e| errors.parameter(&e))?;
    require("element_path", element_path).map_err(|e| errors.parameter(&e))?;

    if context.config.read_only {
        return Err(errors.read_only());
    }

    let pid = resolve_app(context, errors, app)?;
    context
        .blocklist
        .check(app, context.apps.as_ref(), context.elements.as_ref())
        .map_err(|e| errors.engine(&e))?;

    let rate_limit = context.rate_limiter.check_and_record().await;

    let path = element_path_for(context, errors, element_path, pid)?;
    let element = resolve_element(context, errors, &path)?;

    Ok(WriteTarget {
        pid,
        element,
        path,
        rate_limit,
    })
}

/// Read back an element after a write; unreadable attributes are left empty
pub(super) fn read_state(
    context: &ServerContext,
    element: ElementHandle,
    path: &ElementPath,
) -> ElementStateInfo {
    let bridge = context.elements.as_ref();
    ElementStateInfo {
        role: bridge.role(element).ok().map(|role| role.to_string()),
        title: bridge.string_attribute(&Attribute::Title, element).ok(),
        value: bridge
            .attribute(&Attribute::Value, element)
            .ok()
            .and_then(|value| value.display_value()),
        enabled: bridge.bool_attribute(&Attribute::Enabled, element).ok(),
        focused: bridge.bool_attribute(&Attribute::Focused, element).ok(),
        actions: bridge
            .action_names(element)
            .map(|actions| actions.iter().map(ToString::to_string).collect())
            .unwrap_or_default(),
        path: path.to_string(),
    }
}
