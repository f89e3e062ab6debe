//! Constants used throughout the MCP server
//!
//! Engine limits live in `ax_mcp_core::constants`; this module holds what
//! only the tool layer needs.

/// Environment variable that switches on read-only mode
pub const ENV_READ_ONLY: &str = "AX_MCP_READ_ONLY";

/// Values of [`ENV_READ_ONLY`] that enable read-only mode (case-insensitive)
pub const READ_ONLY_TRUTHY: [&str; 2] = ["1", "true"];

/// Path reported for a focused element whose location cannot be derived
pub const UNLOCATED_FOCUS_PATH: &str = "focused";

/// `list_windows` includes minimized windows unless told otherwise
pub const DEFAULT_INCLUDE_MINIMIZED: bool = true;

/// Guidance attached to parameter validation failures
pub const PARAMETER_GUIDANCE: &str = "Check parameter names and types against the tool schema.";

/// Guidance attached to read-only rejections
pub const READ_ONLY_GUIDANCE: &str = "Remove the --read-only flag or unset AX_MCP_READ_ONLY";

/// Instructions advertised to MCP clients
pub const SERVER_INSTRUCTIONS: &str = "ax-mcp exposes desktop applications through their accessibility tree. \
    Start with list_windows or get_ui_tree to discover element paths such as \
    app(1234)/AXWindow[0]/AXButton[1], use find_element to search by role, title or value, \
    then act with perform_action or set_value. observe_changes records UI events for a \
    bounded window. Write tools can be disabled with --read-only and are rate limited.";
