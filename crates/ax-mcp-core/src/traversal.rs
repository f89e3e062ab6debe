//! Bounded snapshot of an element subtree

use crate::bridge::{AccessibilityBridge, Attribute, ElementHandle, Role};
use crate::constants::{DEFAULT_OPERATION_TIMEOUT, DEFAULT_TREE_DEPTH};
use crate::errors::{AccessibilityError, TraversalError};
use crate::path::{ElementPath, PathComponent};
use ax_mcp_protocol::TreeNode;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// A live handle paired with the canonical path that reaches it
#[derive(Debug, Clone, PartialEq)]
pub struct ElementRef {
    pub handle: ElementHandle,
    pub path: ElementPath,
}

impl ElementRef {
    pub fn new(handle: ElementHandle, path: ElementPath) -> Self {
        Self { handle, path }
    }

    /// Root element of the application with `pid`
    pub fn app_root(pid: i32, bridge: &dyn AccessibilityBridge) -> Result<Self, AccessibilityError> {
        Ok(Self {
            handle: bridge.create_app_root(pid)?,
            path: ElementPath::app(pid),
        })
    }
}

#[derive(Debug, Clone)]
pub struct TraversalOptions {
    /// Number of levels in the snapshot; the root alone is depth 1
    pub max_depth: usize,
    /// Roles kept below the root; `None` keeps everything
    pub role_filter: Option<HashSet<Role>>,
    /// Attributes read for each node; `None` reads title and value
    pub include_attributes: Option<HashSet<Attribute>>,
    pub timeout: Duration,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_TREE_DEPTH,
            role_filter: None,
            include_attributes: None,
            timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

impl TraversalOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_role_filter(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.role_filter = Some(roles.into_iter().collect());
        self
    }

    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.include_attributes = Some(attributes.into_iter().collect());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn includes(&self, attribute: &Attribute) -> bool {
        self.include_attributes
            .as_ref()
            .is_none_or(|set| set.contains(attribute))
    }

    fn keeps(&self, role: &Role) -> bool {
        self.role_filter.as_ref().is_none_or(|set| set.contains(role))
    }
}

/// Snapshot the subtree under `root`
///
/// Failures below the root are skipped so a partial tree is still returned.
/// A timeout anywhere aborts the whole call.
pub fn traverse(
    root: &ElementRef,
    options: &TraversalOptions,
    bridge: &dyn AccessibilityBridge,
) -> Result<TreeNode, TraversalError> {
    if options.max_depth < 1 {
        return Err(TraversalError::InvalidDepth(options.max_depth));
    }

    let walk = Walk {
        options,
        bridge,
        deadline: Instant::now() + options.timeout,
    };
    let role = bridge.role(root.handle)?;
    let tree = walk.visit(root.handle, &root.path, role, 0)?;

    tracing::debug!(
        target: "ax_mcp::bridge",
        root = %root.path,
        nodes = tree.node_count(),
        max_depth = options.max_depth,
        "traversal complete"
    );
    Ok(tree)
}

struct Walk<'a> {
    options: &'a TraversalOptions,
    bridge: &'a dyn AccessibilityBridge,
    deadline: Instant,
}

impl Walk<'_> {
    fn visit(
        &self,
        handle: ElementHandle,
        path: &ElementPath,
        role: Role,
        depth: usize,
    ) -> Result<TreeNode, TraversalError> {
        if Instant::now() > self.deadline {
            return Err(TraversalError::TimeoutExceeded(self.options.timeout));
        }
        if depth > 0 && !self.options.keeps(&role) {
            return Err(TraversalError::InvalidElement);
        }

        let title = if self.options.includes(&Attribute::Title) {
            self.bridge.string_attribute(&Attribute::Title, handle).ok()
        } else {
            None
        };
        let value = if self.options.includes(&Attribute::Value) {
            self.bridge
                .attribute(&Attribute::Value, handle)
                .ok()
                .and_then(|value| value.display_value())
        } else {
            None
        };
        let actions = self
            .bridge
            .action_names(handle)
            .map(|actions| actions.iter().map(ToString::to_string).collect())
            .unwrap_or_default();
        let child_handles = self.bridge.children(handle).unwrap_or_default();

        let mut children = Vec::new();
        if depth + 1 < self.options.max_depth {
            let mut seen: HashMap<Role, usize> = HashMap::new();
            for child in &child_handles {
                let Ok(child_role) = self.bridge.role(*child) else {
                    continue;
                };
                let counter = seen.entry(child_role.clone()).or_default();
                let index = *counter;
                *counter += 1;

                let child_path = path.child(PathComponent::ChildByRoleIndex {
                    role: child_role.clone(),
                    index,
                });
                match self.visit(*child, &child_path, child_role, depth + 1) {
                    Ok(node) => children.push(node),
                    Err(err @ TraversalError::TimeoutExceeded(_)) => return Err(err),
                    Err(TraversalError::InvalidElement) => {}
                    Err(err) => {
                        tracing::trace!(
                            target: "ax_mcp::bridge",
                            path = %child_path,
                            error = %err,
                            "skipping child"
                        );
                    }
                }
            }
        }

        Ok(TreeNode {
            role: role.to_string(),
            title,
            value,
            children,
            actions,
            path: path.to_string(),
            child_count: child_handles.len(),
            depth,
        })
    }
}
