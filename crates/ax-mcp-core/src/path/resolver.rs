//! Walks an element path against the accessibility bridge

use super::{ElementPath, PathComponent};
use crate::bridge::{AccessibilityBridge, Attribute, ElementHandle, Role};
use crate::constants::{DEFAULT_OPERATION_TIMEOUT, MAX_PATH_COMPONENTS};
use crate::errors::{AccessibilityError, PathError};
use std::time::{Duration, Instant};

/// Resolve `path` to a live element handle
///
/// The path is validated before any bridge call. The deadline derived from
/// `timeout` (default 5s) is checked before every step.
pub fn resolve(
    path: &ElementPath,
    bridge: &dyn AccessibilityBridge,
    timeout: Option<Duration>,
) -> Result<ElementHandle, PathError> {
    path.validate()?;

    let timeout = timeout.unwrap_or(DEFAULT_OPERATION_TIMEOUT);
    let deadline = Instant::now() + timeout;

    let (first, rest) = path
        .components()
        .split_first()
        .ok_or(PathError::EmptyPath)?;

    check_deadline(deadline, timeout)?;
    let mut current = resolve_root(first, bridge)?;

    for component in rest {
        check_deadline(deadline, timeout)?;
        current = resolve_step(current, component, bridge)?;
    }

    tracing::trace!(target: "ax_mcp::bridge", %path, "resolved element path");
    Ok(current)
}

/// Canonical path of `element` inside the application `pid`
///
/// Follows parent links up to the application root, numbering each step by
/// role among its siblings the same way traversal snapshots do.
pub fn locate(
    element: ElementHandle,
    pid: i32,
    bridge: &dyn AccessibilityBridge,
) -> Result<ElementPath, PathError> {
    let root = bridge.create_app_root(pid)?;
    let mut steps = Vec::new();
    let mut current = element;

    while current != root {
        if steps.len() >= MAX_PATH_COMPONENTS {
            return Err(PathError::PathTooLong(steps.len() + 1));
        }
        let parent = match bridge.element_attribute(&Attribute::Parent, current) {
            Ok(parent) => parent,
            Err(AccessibilityError::NoValue) => {
                return Err(PathError::ElementNotFound(format!(
                    "element is not inside app({pid})"
                )));
            }
            Err(err) => return Err(err.into()),
        };
        let role = bridge.role(current)?;
        let index = bridge
            .children(parent)?
            .into_iter()
            .filter(|sibling| has_role(*sibling, &role, bridge))
            .position(|sibling| sibling == current)
            .ok_or_else(|| PathError::ElementNotFound(format!("{role} under app({pid})")))?;
        steps.push(PathComponent::ChildByRoleIndex { role, index });
        current = parent;
    }

    steps.push(PathComponent::AppByPid(pid));
    steps.reverse();
    Ok(ElementPath::new(steps))
}

fn check_deadline(deadline: Instant, timeout: Duration) -> Result<(), PathError> {
    if Instant::now() > deadline {
        return Err(PathError::TimeoutExceeded(timeout));
    }
    Ok(())
}

fn resolve_root(
    component: &PathComponent,
    bridge: &dyn AccessibilityBridge,
) -> Result<ElementHandle, PathError> {
    match component {
        PathComponent::AppByPid(pid) => Ok(bridge.create_app_root(*pid)?),
        // Names are mapped to pids by the app resolver before a path is built
        PathComponent::AppByName(name) => Err(PathError::invalid_format(format!(
            "app(\"{name}\") must be resolved to a pid before path resolution"
        ))),
        _ => Err(PathError::invalid_format("First component must be app")),
    }
}

fn resolve_step(
    current: ElementHandle,
    component: &PathComponent,
    bridge: &dyn AccessibilityBridge,
) -> Result<ElementHandle, PathError> {
    match component {
        PathComponent::WindowByIndex(index) => {
            let windows = bridge.windows(current)?;
            match windows.get(*index) {
                Some(window) => Ok(*window),
                None => Err(PathError::component_not_found(
                    component,
                    window_titles(&windows, bridge),
                )),
            }
        }
        PathComponent::WindowByTitle(title) => {
            let windows = bridge.windows(current)?;
            windows
                .iter()
                .copied()
                .find(|window| title_of(*window, bridge).as_deref() == Some(title.as_str()))
                .ok_or_else(|| {
                    PathError::component_not_found(component, window_titles(&windows, bridge))
                })
        }
        PathComponent::ChildByRoleIndex { role, index } => {
            let children = bridge.children(current)?;
            let matching: Vec<ElementHandle> = children
                .into_iter()
                .filter(|child| has_role(*child, role, bridge))
                .collect();
            match matching.get(*index) {
                Some(child) => Ok(*child),
                None => Err(PathError::component_not_found(
                    component,
                    describe_all(&matching, bridge),
                )),
            }
        }
        PathComponent::ChildByRoleTitle { role, title } => {
            let children = bridge.children(current)?;
            children
                .iter()
                .copied()
                .find(|child| {
                    has_role(*child, role, bridge)
                        && title_of(*child, bridge).as_deref() == Some(title.as_str())
                })
                .ok_or_else(|| {
                    PathError::component_not_found(component, describe_all(&children, bridge))
                })
        }
        PathComponent::AppByPid(_) | PathComponent::AppByName(_) => Err(
            PathError::invalid_format("app selector must be the first component"),
        ),
    }
}

fn has_role(element: ElementHandle, role: &Role, bridge: &dyn AccessibilityBridge) -> bool {
    bridge.role(element).is_ok_and(|actual| actual == *role)
}

fn title_of(element: ElementHandle, bridge: &dyn AccessibilityBridge) -> Option<String> {
    bridge.string_attribute(&Attribute::Title, element).ok()
}

fn window_titles(windows: &[ElementHandle], bridge: &dyn AccessibilityBridge) -> Vec<String> {
    windows
        .iter()
        .filter_map(|window| title_of(*window, bridge))
        .collect()
}

fn describe_all(elements: &[ElementHandle], bridge: &dyn AccessibilityBridge) -> Vec<String> {
    elements
        .iter()
        .filter_map(|element| {
            let role = bridge.role(*element).ok()?;
            Some(match title_of(*element, bridge) {
                Some(title) => format!("{role}[\"{title}\"]"),
                None => role.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desktop::{ApplicationSpec, ElementSpec, InMemoryDesktop};
    use crate::errors::AccessibilityError;

    fn desktop() -> InMemoryDesktop {
        let desktop = InMemoryDesktop::new();
        desktop
            .insert_application(ApplicationSpec::new(
                1234,
                "TextEdit",
                ElementSpec::new("AXApplication")
                    .title("TextEdit")
                    .child(
                        ElementSpec::new("AXWindow")
                            .title("Doc1")
                            .child(ElementSpec::new("AXButton").title("Save"))
                            .child(ElementSpec::new("AXStaticText").value("hello"))
                            .child(ElementSpec::new("AXButton").title("Cancel")),
                    )
                    .child(ElementSpec::new("AXWindow").title("Inbox")),
            ))
            .unwrap();
        desktop
    }

    fn resolve_str(path: &str, desktop: &InMemoryDesktop) -> Result<ElementHandle, PathError> {
        resolve(&ElementPath::parse(path)?, desktop, None)
    }

    fn title(handle: ElementHandle, desktop: &InMemoryDesktop) -> String {
        desktop.string_attribute(&Attribute::Title, handle).unwrap()
    }

    #[test]
    fn test_locate_matches_resolve() {
        let desktop = desktop();
        for path in [
            "app(1234)",
            "app(1234)/AXWindow[0]/AXButton[1]",
            "app(1234)/AXWindow[0]/AXStaticText[0]",
            "app(1234)/AXWindow[1]",
        ] {
            let handle = resolve_str(path, &desktop).unwrap();
            assert_eq!(locate(handle, 1234, &desktop).unwrap().to_string(), path);
        }
    }

    #[test]
    fn test_locate_rejects_foreign_elements() {
        let desktop = desktop();
        desktop
            .insert_application(ApplicationSpec::new(
                99,
                "Other",
                ElementSpec::new("AXApplication").child(ElementSpec::new("AXWindow")),
            ))
            .unwrap();
        let window = resolve_str("app(99)/AXWindow[0]", &desktop).unwrap();
        assert!(matches!(
            locate(window, 1234, &desktop),
            Err(PathError::ElementNotFound(_))
        ));
    }

    #[test]
    fn test_resolves_windows_and_children() {
        let desktop = desktop();

        let save = resolve_str("app(1234)/window[0]/AXButton[0]", &desktop).unwrap();
        assert_eq!(title(save, &desktop), "Save");

        let cancel = resolve_str("app(1234)/window[\"Doc1\"]/AXButton[1]", &desktop).unwrap();
        assert_eq!(title(cancel, &desktop), "Cancel");

        let by_title = resolve_str("app(1234)/window[0]/AXButton[\"Cancel\"]", &desktop).unwrap();
        assert_eq!(by_title, cancel);

        let inbox = resolve_str("app(1234)/AXWindow[1]", &desktop).unwrap();
        assert_eq!(title(inbox, &desktop), "Inbox");
    }

    #[test]
    fn test_validation_precedes_bridge_calls() {
        let desktop = desktop();
        desktop.set_permission_denied(true);

        assert_eq!(resolve_str("app(-1)", &desktop), Err(PathError::InvalidPid(-1)));
        assert_eq!(resolve_str("app(0)", &desktop), Err(PathError::InvalidPid(0)));
        assert_eq!(
            resolve(&ElementPath::new(vec![]), &desktop, None),
            Err(PathError::EmptyPath)
        );
    }

    #[test]
    fn test_app_by_name_is_rejected() {
        let desktop = desktop();
        assert!(matches!(
            resolve_str("app(\"TextEdit\")/window[0]", &desktop),
            Err(PathError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_missing_window_lists_titles() {
        let desktop = desktop();
        let err = resolve_str("app(1234)/window[\"Doc2\"]", &desktop).unwrap_err();
        assert_eq!(
            err,
            PathError::ComponentNotFound {
                component: "window[\"Doc2\"]".to_string(),
                available: vec!["Doc1".to_string(), "Inbox".to_string()],
            }
        );

        let err = resolve_str("app(1234)/window[5]", &desktop).unwrap_err();
        assert!(matches!(err, PathError::ComponentNotFound { .. }));
    }

    #[test]
    fn test_missing_child_lists_alternatives() {
        let desktop = desktop();

        let err = resolve_str("app(1234)/window[0]/AXButton[2]", &desktop).unwrap_err();
        assert_eq!(
            err,
            PathError::ComponentNotFound {
                component: "AXButton[2]".to_string(),
                available: vec![
                    "AXButton[\"Save\"]".to_string(),
                    "AXButton[\"Cancel\"]".to_string()
                ],
            }
        );

        let err = resolve_str("app(1234)/window[0]/AXButton[\"Open\"]", &desktop).unwrap_err();
        let PathError::ComponentNotFound { available, .. } = err else {
            panic!("expected component_not_found, got {err:?}");
        };
        assert_eq!(available.len(), 3);
        assert!(available.contains(&"AXStaticText".to_string()));
    }

    #[test]
    fn test_bridge_failures_are_wrapped() {
        let desktop = desktop();
        assert_eq!(
            resolve_str("app(9999)/window[0]", &desktop),
            Err(PathError::Accessibility(AccessibilityError::InvalidElement))
        );

        desktop.set_permission_denied(true);
        assert!(matches!(
            resolve_str("app(1234)/window[0]", &desktop),
            Err(PathError::Accessibility(AccessibilityError::PermissionDenied { .. }))
        ));
    }

    #[test]
    fn test_deadline_is_enforced_per_step() {
        let desktop = desktop();
        desktop.set_latency(Duration::from_millis(20));

        let path = ElementPath::parse("app(1234)/window[0]/AXButton[1]").unwrap();
        let err = resolve(&path, &desktop, Some(Duration::from_millis(10))).unwrap_err();
        assert_eq!(err, PathError::TimeoutExceeded(Duration::from_millis(10)));
    }
}
