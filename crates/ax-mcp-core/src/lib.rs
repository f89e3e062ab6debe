//! Accessibility engine behind the ax-mcp server
//!
//! This crate turns a platform accessibility layer, reached through the
//! traits in [`bridge`], into the operations the MCP tools need: element
//! path parsing and resolution, bounded tree snapshots, criteria search,
//! change observation, and the write safety layer.
//!
//! [`desktop::InMemoryDesktop`] implements every bridge trait over an
//! in-memory element tree and backs both the test suites and fixture mode.

pub mod bridge;
pub mod constants;
pub mod desktop;
pub mod errors;
pub mod finder;
pub mod observer;
pub mod path;
pub mod security;
pub mod traversal;

pub use ax_mcp_protocol::{
    ElementInfo, ElementStateInfo, ObserverEvent, ObserverEventType, Point, Size, ToolError,
    TreeNode, WindowInfo,
};
pub use bridge::{
    AccessibilityBridge, Action, AppResolver, Attribute, AttributeValue, ElementHandle,
    ObserverBridge, Role, RunningApplication,
};
pub use desktop::InMemoryDesktop;
pub use errors::{
    AccessibilityError, AppResolutionError, BlocklistError, ErrorGuidance, ObserverError,
    PathError, TraversalError,
};
pub use finder::{SearchCriteria, SearchMatch, SearchResults, find};
pub use observer::{EventCollectionResult, ObservationRequest, ObserverManager};
pub use path::{ElementPath, PathComponent, locate, resolve};
pub use security::{ApplicationBlocklist, RateLimitResult, RateLimiter};
pub use traversal::{ElementRef, TraversalOptions, traverse};
