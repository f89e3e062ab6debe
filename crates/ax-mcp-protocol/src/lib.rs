//! Common wire types for ax-mcp
//!
//! This crate defines the serializable shapes shared between the accessibility
//! engine and the MCP tool layer: tree snapshots, element summaries,
//! observation events and structured tool errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable snapshot of one accessibility element and its expanded subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Role wire name (e.g. "AXButton", or any custom role string)
    pub role: String,
    /// Title, absent when not read or not present
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub title: Option<String>,
    /// Value in display form, absent when not read or not present
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<String>,
    /// Expanded children, in bridge order
    pub children: Vec<TreeNode>,
    /// Supported action names
    pub actions: Vec<String>,
    /// Canonical element path
    pub path: String,
    /// Number of children reported by the bridge, even when not expanded
    pub child_count: usize,
    /// Distance from the traversal root
    pub depth: usize,
}

impl TreeNode {
    /// Number of nodes in this snapshot, including the node itself
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }

    /// Visit the snapshot in pre-order
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a TreeNode) -> bool) -> bool {
        if !visit(self) {
            return false;
        }
        for child in &self.children {
            if !child.walk(visit) {
                return false;
            }
        }
        true
    }
}

/// Summary of a single element returned by search and focus tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<String>,
    pub path: String,
    pub actions: Vec<String>,
}

/// Element state read back after a write operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementStateInfo {
    pub role: Option<String>,
    pub title: Option<String>,
    pub value: Option<String>,
    pub enabled: Option<bool>,
    pub focused: Option<bool>,
    pub actions: Vec<String>,
    pub path: String,
}

/// A point in screen coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A size in screen coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Top-level window of a running application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub title: Option<String>,
    pub position: Point,
    pub size: Size,
    pub minimized: bool,
    pub frontmost: bool,
    pub app: String,
}

/// Kind of UI change reported by an observation session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObserverEventType {
    ValueChanged,
    FocusChanged,
    WindowCreated,
    WindowDestroyed,
    TitleChanged,
}

impl ObserverEventType {
    /// Every event type, in the order used when the caller does not pick any
    pub const ALL: [ObserverEventType; 5] = [
        ObserverEventType::ValueChanged,
        ObserverEventType::FocusChanged,
        ObserverEventType::WindowCreated,
        ObserverEventType::WindowDestroyed,
        ObserverEventType::TitleChanged,
    ];

    /// Name used in tool parameters and responses
    pub fn as_str(&self) -> &'static str {
        match self {
            ObserverEventType::ValueChanged => "value_changed",
            ObserverEventType::FocusChanged => "focus_changed",
            ObserverEventType::WindowCreated => "window_created",
            ObserverEventType::WindowDestroyed => "window_destroyed",
            ObserverEventType::TitleChanged => "title_changed",
        }
    }

    /// Native notification this event type is delivered through
    pub fn notification_name(&self) -> &'static str {
        match self {
            ObserverEventType::ValueChanged => "AXValueChanged",
            ObserverEventType::FocusChanged => "AXFocusedUIElementChanged",
            ObserverEventType::WindowCreated => "AXWindowCreated",
            ObserverEventType::WindowDestroyed => "AXUIElementDestroyed",
            ObserverEventType::TitleChanged => "AXTitleChanged",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub fn from_notification_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.notification_name() == name)
    }

    /// Comma separated list of valid names, for error messages
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One UI change captured during an observation window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: ObserverEventType,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub element_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub element_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub element_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub new_value: Option<String>,
}

impl ObserverEvent {
    /// Create an event stamped with the current time
    pub fn now(event_type: ObserverEventType) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            element_role: None,
            element_title: None,
            element_path: None,
            new_value: None,
        }
    }
}

/// Structured error record returned to tool callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolError {
    /// Tool that failed (e.g. "get_ui_tree")
    pub operation: String,
    /// Machine-readable error kind (e.g. "permission_denied")
    pub error_type: String,
    /// Human-readable description
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub app: Option<String>,
    /// Remediation hint for the caller
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub guidance: Option<String>,
}

impl ToolError {
    pub fn new(
        operation: impl Into<String>,
        error_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.into(),
            error_type: error_type.into(),
            message: message.into(),
            app: None,
            guidance: None,
        }
    }

    pub fn with_app(mut self, app: Option<impl Into<String>>) -> Self {
        self.app = app.map(Into::into);
        self
    }

    pub fn with_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.guidance = Some(guidance.into());
        self
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed ({}): {}", self.operation, self.error_type, self.message)
    }
}

impl std::error::Error for ToolError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(role: &str, path: &str, depth: usize) -> TreeNode {
        TreeNode {
            role: role.to_string(),
            title: None,
            value: None,
            children: vec![],
            actions: vec![],
            path: path.to_string(),
            child_count: 0,
            depth,
        }
    }

    #[test]
    fn test_tree_node_omits_absent_attributes() {
        let node = leaf("Application", "app(1234)", 0);
        let json = serde_json::to_value(&node).unwrap();
        assert!(json.get("title").is_none());
        assert!(json.get("value").is_none());
        assert_eq!(json["child_count"], 0);
        assert_eq!(json["path"], "app(1234)");
    }

    #[test]
    fn test_node_count_and_walk_order() {
        let mut root = leaf("AXWindow", "app(1)", 0);
        let mut group = leaf("AXGroup", "app(1)/AXGroup[0]", 1);
        group
            .children
            .push(leaf("AXButton", "app(1)/AXGroup[0]/AXButton[0]", 2));
        root.children.push(group);
        root.children.push(leaf("AXButton", "app(1)/AXButton[0]", 1));

        assert_eq!(root.node_count(), 4);

        let mut seen = Vec::new();
        root.walk(&mut |node| {
            seen.push(node.path.as_str());
            true
        });
        assert_eq!(
            seen,
            vec![
                "app(1)",
                "app(1)/AXGroup[0]",
                "app(1)/AXGroup[0]/AXButton[0]",
                "app(1)/AXButton[0]"
            ]
        );
    }

    #[test]
    fn test_walk_stops_early() {
        let mut root = leaf("AXWindow", "app(1)", 0);
        root.children.push(leaf("AXButton", "app(1)/AXButton[0]", 1));
        root.children.push(leaf("AXButton", "app(1)/AXButton[1]", 1));

        let mut visited = 0;
        let completed = root.walk(&mut |_| {
            visited += 1;
            visited < 2
        });
        assert!(!completed);
        assert_eq!(visited, 2);
    }

    #[test]
    fn test_event_type_names() {
        for event_type in ObserverEventType::ALL {
            assert_eq!(
                ObserverEventType::from_name(event_type.as_str()),
                Some(event_type)
            );
            assert_eq!(
                ObserverEventType::from_notification_name(event_type.notification_name()),
                Some(event_type)
            );
        }
        assert_eq!(
            ObserverEventType::WindowDestroyed.notification_name(),
            "AXUIElementDestroyed"
        );
        assert_eq!(ObserverEventType::from_name("resized"), None);
        assert_eq!(ObserverEventType::from_notification_name("AXMoved"), None);
    }

    #[test]
    fn test_event_type_serializes_snake_case() {
        let json = serde_json::to_string(&ObserverEventType::FocusChanged).unwrap();
        assert_eq!(json, "\"focus_changed\"");
    }

    #[test]
    fn test_tool_error_serialization() {
        let err = ToolError::new("perform_action", "read_only_mode", "Write operations are disabled")
            .with_guidance("Remove --read-only");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error_type"], "read_only_mode");
        assert_eq!(json["guidance"], "Remove --read-only");
        assert!(json.get("app").is_none());

        let err = err.with_app(Some("Safari"));
        assert_eq!(err.app.as_deref(), Some("Safari"));
        assert!(err.to_string().contains("perform_action"));
    }
}
