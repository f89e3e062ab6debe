//! Element search tool implementation (find_element)

use super::{ToolResult, resolve_app, respond};
use crate::context::ServerContext;
use crate::errors::{ErrorContext, ParameterError};
use crate::requests::FindElementRequest;
use ax_mcp_core::constants::DEFAULT_MAX_RESULTS;
use ax_mcp_core::{ElementInfo, ElementRef, Role, SearchCriteria, ToolError, find};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct FindElementResponse {
    pub elements: Vec<ElementInfo>,
    pub has_more_results: bool,
    pub result_count: usize,
}

/// Search an application for elements matching the request's criteria
pub async fn find_element(context: &ServerContext, request: FindElementRequest) -> ToolResult {
    let errors = ErrorContext::new("find_element", Some(request.app.as_str()));
    respond(search(context, &errors, &request).await)
}

async fn search(
    context: &ServerContext,
    errors: &ErrorContext<'_>,
    request: &FindElementRequest,
) -> Result<FindElementResponse, ToolError> {
    let max_results = match request.max_results {
        None => DEFAULT_MAX_RESULTS,
        Some(max) => usize::try_from(max)
            .ok()
            .filter(|max| *max > 0)
            .ok_or_else(|| {
                errors.parameter(&ParameterError::invalid_value(
                    "max_results",
                    max,
                    "max_results must be greater than 0",
                ))
            })?,
    };

    let pid = resolve_app(context, errors, &request.app)?;
    let root = ElementRef::app_root(pid, context.elements.as_ref()).map_err(|e| errors.engine(&e))?;
    let criteria = SearchCriteria {
        role: request.role.as_deref().map(Role::from),
        title: request.title.clone(),
        value: request.value.clone(),
        identifier: request.identifier.clone(),
        max_results,
        ..SearchCriteria::default()
    };

    let elements = Arc::clone(&context.elements);
    let results = tokio::task::spawn_blocking(move || find(&criteria, &root, elements.as_ref()))
        .await
        .map_err(|e| errors.internal(e))?
        .map_err(|e| errors.engine(&e))?;

    tracing::info!(
        target: "ax_mcp::tools",
        pid,
        found = results.matches.len(),
        "find_element"
    );
    let elements: Vec<ElementInfo> = results.matches.into_iter().map(|m| m.info).collect();
    Ok(FindElementResponse {
        result_count: elements.len(),
        has_more_results: results.has_more_results,
        elements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{TEXTEDIT, context, parse};

    fn request(app: &str) -> FindElementRequest {
        FindElementRequest {
            app: app.to_string(),
            ..FindElementRequest::default()
        }
    }

    #[tokio::test]
    async fn test_find_buttons() {
        let (_, context) = context();
        let req = FindElementRequest {
            role: Some("AXButton".into()),
            ..request("TextEdit")
        };
        let value = parse(&find_element(&context, req).await);
        assert_eq!(value["result_count"], 3);
        assert_eq!(value["has_more_results"], false);
        let titles: Vec<&str> = value["elements"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Bold", "Italic", "Save"]);
        assert_eq!(
            value["elements"][1]["path"],
            format!("app({TEXTEDIT})/AXWindow[0]/AXToolbar[0]/AXButton[1]")
        );
        assert_eq!(value["elements"][1]["actions"], serde_json::json!(["AXPress"]));
    }

    #[tokio::test]
    async fn test_title_substring_and_cap() {
        let (_, context) = context();
        let req = FindElementRequest {
            title: Some("b".into()),
            max_results: Some(1),
            ..request("com.apple.TextEdit")
        };
        let value = parse(&find_element(&context, req).await);
        assert_eq!(value["result_count"], 1);
        assert_eq!(value["has_more_results"], true);
        assert_eq!(value["elements"][0]["title"], "Bold");
    }

    #[tokio::test]
    async fn test_value_match() {
        let (_, context) = context();
        let req = FindElementRequest {
            value: Some("draft".into()),
            ..request("TextEdit")
        };
        let value = parse(&find_element(&context, req).await);
        assert_eq!(value["result_count"], 1);
        assert_eq!(value["elements"][0]["role"], "AXTextField");
    }

    #[tokio::test]
    async fn test_invalid_max_results() {
        let (_, context) = context();
        let req = FindElementRequest {
            max_results: Some(0),
            ..request("TextEdit")
        };
        let value = parse(&find_element(&context, req).await);
        assert_eq!(value["error_type"], "invalid_parameter");
    }
}
