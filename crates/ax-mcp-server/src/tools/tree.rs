//! UI tree tool implementation (get_ui_tree)

use super::{ToolResult, resolve_app, respond};
use crate::context::ServerContext;
use crate::errors::{ErrorContext, ParameterError};
use crate::requests::GetUiTreeRequest;
use ax_mcp_core::constants::DEFAULT_TREE_DEPTH;
use ax_mcp_core::{Attribute, ElementRef, Role, ToolError, TraversalOptions, TreeNode, traverse};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct UiTreeResponse {
    pub tree: TreeNode,
    pub has_more_results: bool,
    pub result_count: usize,
    pub depth: usize,
}

/// Snapshot an application's element tree
pub async fn get_ui_tree(context: &ServerContext, request: GetUiTreeRequest) -> ToolResult {
    let errors = ErrorContext::new("get_ui_tree", Some(request.app.as_str()));
    respond(snapshot(context, &errors, &request).await)
}

async fn snapshot(
    context: &ServerContext,
    errors: &ErrorContext<'_>,
    request: &GetUiTreeRequest,
) -> Result<UiTreeResponse, ToolError> {
    let depth = match request.depth {
        None => DEFAULT_TREE_DEPTH,
        Some(depth) => usize::try_from(depth)
            .ok()
            .filter(|depth| *depth > 0)
            .ok_or_else(|| {
                errors.parameter(&ParameterError::invalid_value(
                    "depth",
                    depth,
                    "Depth must be greater than 0",
                ))
            })?,
    };

    let pid = resolve_app(context, errors, &request.app)?;
    let root = ElementRef::app_root(pid, context.elements.as_ref()).map_err(|e| errors.engine(&e))?;

    let mut options = TraversalOptions::default().with_max_depth(depth);
    if let Some(roles) = &request.filter_roles {
        options = options.with_role_filter(roles.iter().map(|role| Role::from(role.as_str())));
    }
    if let Some(attributes) = &request.include_attributes {
        options = options.with_attributes(
            attributes
                .iter()
                .map(|attribute| Attribute::from(attribute.as_str())),
        );
    }

    let elements = Arc::clone(&context.elements);
    let tree = tokio::task::spawn_blocking(move || traverse(&root, &options, elements.as_ref()))
        .await
        .map_err(|e| errors.internal(e))?
        .map_err(|e| errors.engine(&e))?;

    tracing::info!(
        target: "ax_mcp::tools",
        app = %request.app,
        pid,
        nodes = tree.node_count(),
        "get_ui_tree"
    );
    Ok(UiTreeResponse {
        result_count: tree.node_count(),
        has_more_results: false,
        depth,
        tree,
    })
}
