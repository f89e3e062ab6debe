//! Criteria search over a traversal snapshot

use crate::bridge::{AccessibilityBridge, Role};
use crate::constants::{DEFAULT_MAX_RESULTS, DEFAULT_OPERATION_TIMEOUT, FINDER_TRAVERSAL_DEPTH};
use crate::errors::TraversalError;
use crate::path::{ElementPath, resolve};
use crate::traversal::{ElementRef, TraversalOptions, traverse};
use ax_mcp_protocol::{ElementInfo, TreeNode};

/// What an element must satisfy to be returned
///
/// Every criterion that is set must match. Identifiers are not captured in
/// snapshots, so an `identifier` criterion never matches anything.
#[derive(Debug, Clone)]
pub struct SearchCriteria {
    pub role: Option<Role>,
    /// Substring of the element title
    pub title: Option<String>,
    /// Exact display value
    pub value: Option<String>,
    pub identifier: Option<String>,
    pub case_sensitive: bool,
    pub max_results: usize,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            role: None,
            title: None,
            value: None,
            identifier: None,
            case_sensitive: false,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl SearchCriteria {
    pub fn matches(&self, node: &TreeNode) -> bool {
        if self.identifier.is_some() {
            return false;
        }
        if self.role.as_ref().is_some_and(|role| node.role != role.as_str()) {
            return false;
        }
        if let Some(wanted) = &self.title {
            let Some(title) = &node.title else {
                return false;
            };
            let found = if self.case_sensitive {
                title.contains(wanted.as_str())
            } else {
                title.to_lowercase().contains(&wanted.to_lowercase())
            };
            if !found {
                return false;
            }
        }
        if self
            .value
            .as_deref()
            .is_some_and(|wanted| node.value.as_deref() != Some(wanted))
        {
            return false;
        }
        true
    }
}

/// A live match and the snapshot data it was found with
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch {
    pub element: ElementRef,
    pub info: ElementInfo,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResults {
    pub matches: Vec<SearchMatch>,
    /// Set when exactly `max_results` matches were returned
    pub has_more_results: bool,
}

/// Find elements under `root` matching `criteria`, in pre-order
///
/// Matches are re-resolved from their paths; those that went stale since the
/// snapshot are left out.
pub fn find(
    criteria: &SearchCriteria,
    root: &ElementRef,
    bridge: &dyn AccessibilityBridge,
) -> Result<SearchResults, TraversalError> {
    let options = TraversalOptions::default()
        .with_max_depth(FINDER_TRAVERSAL_DEPTH)
        .with_timeout(DEFAULT_OPERATION_TIMEOUT);
    let tree = traverse(root, &options, bridge)?;

    let mut matches = Vec::new();
    tree.walk(&mut |node| {
        if matches.len() >= criteria.max_results {
            return false;
        }
        if criteria.matches(node) {
            matches.extend(relocate(node, bridge));
        }
        matches.len() < criteria.max_results
    });

    tracing::debug!(
        target: "ax_mcp::bridge",
        root = %root.path,
        found = matches.len(),
        "search complete"
    );
    Ok(SearchResults {
        has_more_results: matches.len() == criteria.max_results,
        matches,
    })
}

fn relocate(node: &TreeNode, bridge: &dyn AccessibilityBridge) -> Option<SearchMatch> {
    let path = ElementPath::parse(&node.path).ok()?;
    let handle = match resolve(&path, bridge, None) {
        Ok(handle) => handle,
        Err(err) => {
            tracing::trace!(target: "ax_mcp::bridge", path = %node.path, error = %err, "match went stale");
            return None;
        }
    };
    Some(SearchMatch {
        element: ElementRef::new(handle, path),
        info: ElementInfo {
            role: node.role.clone(),
            title: node.title.clone(),
            value: node.value.clone(),
            path: node.path.clone(),
            actions: node.actions.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::Attribute;
    use crate::desktop::{ApplicationSpec, ElementSpec, InMemoryDesktop};

    fn toolbar() -> InMemoryDesktop {
        let desktop = InMemoryDesktop::new();
        let buttons = ["Save", "Save As", "Open", "Close", "Save All"]
            .map(|title| ElementSpec::new("AXButton").title(title).actions(["AXPress"]));
        desktop
            .insert_application(ApplicationSpec::new(
                7,
                "Editor",
                ElementSpec::new("AXApplication").child(
                    ElementSpec::new("AXWindow")
                        .title("main.rs")
                        .child(ElementSpec::new("AXToolbar").children(buttons))
                        .child(ElementSpec::new("AXTextField").value("fn main() {}"))
                        .child(ElementSpec::new("AXStaticText").title("saved").identifier("status")),
                ),
            ))
            .unwrap();
        desktop
    }

    fn titles(results: &SearchResults) -> Vec<String> {
        results
            .matches
            .iter()
            .filter_map(|m| m.info.title.clone())
            .collect()
    }

    #[test]
    fn test_title_substring_is_case_insensitive_by_default() {
        let desktop = toolbar();
        let root = ElementRef::app_root(7, &desktop).unwrap();

        let criteria = SearchCriteria {
            title: Some("save".to_string()),
            ..Default::default()
        };
        let results = find(&criteria, &root, &desktop).unwrap();
        assert_eq!(titles(&results), vec!["Save", "Save As", "Save All", "saved"]);
        assert!(!results.has_more_results);

        let criteria = SearchCriteria {
            title: Some("save".to_string()),
            case_sensitive: true,
            ..Default::default()
        };
        let results = find(&criteria, &root, &desktop).unwrap();
        assert_eq!(titles(&results), vec!["saved"]);
    }

    #[test]
    fn test_matches_resolve_to_live_handles() {
        let desktop = toolbar();
        let root = ElementRef::app_root(7, &desktop).unwrap();

        let criteria = SearchCriteria {
            role: Some(Role::Button),
            title: Some("Close".to_string()),
            ..Default::default()
        };
        let results = find(&criteria, &root, &desktop).unwrap();
        let [found] = results.matches.as_slice() else {
            panic!("expected one match, got {:?}", results.matches);
        };
        assert_eq!(found.info.path, "app(7)/AXWindow[0]/AXToolbar[0]/AXButton[3]");
        assert_eq!(found.element.path.to_string(), found.info.path);
        assert_eq!(
            desktop.string_attribute(&Attribute::Title, found.element.handle).unwrap(),
            "Close"
        );
    }

    #[test]
    fn test_value_is_exact() {
        let desktop = toolbar();
        let root = ElementRef::app_root(7, &desktop).unwrap();

        let exact = SearchCriteria {
            value: Some("fn main() {}".to_string()),
            ..Default::default()
        };
        assert_eq!(find(&exact, &root, &desktop).unwrap().matches.len(), 1);

        let partial = SearchCriteria {
            value: Some("fn main".to_string()),
            ..Default::default()
        };
        assert!(find(&partial, &root, &desktop).unwrap().matches.is_empty());
    }

    #[test]
    fn test_result_cap() {
        let desktop = toolbar();
        let root = ElementRef::app_root(7, &desktop).unwrap();

        let capped = SearchCriteria {
            role: Some(Role::Button),
            max_results: 3,
            ..Default::default()
        };
        let results = find(&capped, &root, &desktop).unwrap();
        assert_eq!(titles(&results), vec!["Save", "Save As", "Open"]);
        assert!(results.has_more_results);

        let exact = SearchCriteria {
            role: Some(Role::Button),
            max_results: 5,
            ..Default::default()
        };
        let results = find(&exact, &root, &desktop).unwrap();
        assert_eq!(results.matches.len(), 5);
        assert!(results.has_more_results);

        let roomy = SearchCriteria {
            role: Some(Role::Button),
            ..Default::default()
        };
        let results = find(&roomy, &root, &desktop).unwrap();
        assert_eq!(results.matches.len(), 5);
        assert!(!results.has_more_results);
    }

    #[test]
    fn test_identifier_never_matches() {
        let desktop = toolbar();
        let root = ElementRef::app_root(7, &desktop).unwrap();

        let criteria = SearchCriteria {
            identifier: Some("status".to_string()),
            ..Default::default()
        };
        assert!(find(&criteria, &root, &desktop).unwrap().matches.is_empty());
    }
}
