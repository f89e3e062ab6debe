//! MCP tool request types
//!
//! This module contains all request types used by MCP tool handlers.

use rmcp::schemars;
use serde::Deserialize;

/// Request for get_ui_tree tool
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct GetUiTreeRequest {
    #[schemars(description = "Application name, bundle identifier or numeric PID")]
    pub app: String,
    #[schemars(description = "Number of tree levels to return, at least 1 (default: 3)")]
    pub depth: Option<i64>,
    #[schemars(
        description = "Attributes to read for each node, e.g. ['AXTitle']. Omit to read title and value"
    )]
    pub include_attributes: Option<Vec<String>>,
    #[schemars(description = "Only keep descendants with these roles, e.g. ['AXButton', 'AXTextField']")]
    pub filter_roles: Option<Vec<String>>,
}

/// Request for find_element tool
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct FindElementRequest {
    #[schemars(description = "Application name, bundle identifier or numeric PID")]
    pub app: String,
    #[schemars(description = "Exact role to match (e.g., 'AXButton')")]
    pub role: Option<String>,
    #[schemars(description = "Case-insensitive substring of the element title")]
    pub title: Option<String>,
    #[schemars(description = "Exact element value")]
    pub value: Option<String>,
    #[schemars(description = "Accessibility identifier")]
    pub identifier: Option<String>,
    #[schemars(description = "Maximum number of matches, greater than 0 (default: 20)")]
    pub max_results: Option<i64>,
}

/// Request for get_focused_element tool
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct GetFocusedElementRequest {
    #[schemars(description = "Application to query. Omit for the system-wide focus")]
    pub app: Option<String>,
}

/// Request for list_windows tool
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ListWindowsRequest {
    #[schemars(description = "Application to list. Omit to list every running application")]
    pub app: Option<String>,
    #[schemars(description = "Include minimized windows (default: true)")]
    pub include_minimized: Option<bool>,
}

/// Request for perform_action tool
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct PerformActionRequest {
    #[schemars(description = "Application name, bundle identifier or numeric PID")]
    pub app: String,
    #[schemars(description = "Element path from get_ui_tree or find_element")]
    pub element_path: String,
    #[schemars(
        description = "One of AXPress, AXPick, AXShowMenu, AXConfirm, AXCancel, AXRaise, AXIncrement, AXDecrement"
    )]
    pub action: String,
}

/// Scalar accepted by set_value
#[derive(Debug, Clone, PartialEq, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Request for set_value tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetValueRequest {
    #[schemars(description = "Application name, bundle identifier or numeric PID")]
    pub app: String,
    #[schemars(description = "Element path from get_ui_tree or find_element")]
    pub element_path: String,
    #[schemars(description = "New value: string, boolean or number")]
    pub value: ScalarValue,
}

/// Request for observe_changes tool
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ObserveChangesRequest {
    #[schemars(description = "Application name, bundle identifier or numeric PID")]
    pub app: String,
    #[schemars(
        description = "Event types to record: value_changed, focus_changed, window_created, window_destroyed, title_changed. Omit for all"
    )]
    pub events: Option<Vec<String>>,
    #[schemars(description = "Only observe this element and its descendants")]
    pub element_path: Option<String>,
    #[schemars(description = "Observation window in seconds, clamped to 1-300 (default: 30)")]
    pub duration: Option<i64>,
}
