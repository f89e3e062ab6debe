//! Element path grammar
//!
//! A path addresses one element by walking from an application root:
//!
//! ```text
//! app(<pid>|"<name>") ( / window[<index>|"<title>"] )? ( / <Role>[<index>|"<title>"] )*
//! ```
//!
//! Parsing and `Display` are exact inverses for canonical strings. Titles
//! cannot contain `/`, which is the component separator.

mod resolver;

pub use resolver::{locate, resolve};

use crate::bridge::Role;
use crate::constants::MAX_PATH_COMPONENTS;
use crate::errors::PathError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One addressing step in an [`ElementPath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathComponent {
    AppByPid(i32),
    AppByName(String),
    WindowByIndex(usize),
    WindowByTitle(String),
    ChildByRoleIndex { role: Role, index: usize },
    ChildByRoleTitle { role: Role, title: String },
}

impl PathComponent {
    pub fn is_app_selector(&self) -> bool {
        matches!(self, PathComponent::AppByPid(_) | PathComponent::AppByName(_))
    }

    fn parse(part: &str) -> Result<Self, PathError> {
        if let Some(rest) = part.strip_prefix("app(") {
            let content = rest
                .strip_suffix(')')
                .ok_or_else(|| PathError::invalid_format(part))?;
            return match unquote(content) {
                Some(name) => Ok(PathComponent::AppByName(name.to_string())),
                None => content
                    .parse::<i32>()
                    .map(PathComponent::AppByPid)
                    .map_err(|_| PathError::invalid_format(part)),
            };
        }

        if let Some(rest) = part.strip_prefix("window[") {
            let content = rest
                .strip_suffix(']')
                .ok_or_else(|| PathError::invalid_format(part))?;
            return match unquote(content) {
                Some(title) => Ok(PathComponent::WindowByTitle(title.to_string())),
                None => content
                    .parse::<usize>()
                    .map(PathComponent::WindowByIndex)
                    .map_err(|_| PathError::invalid_format(part)),
            };
        }

        let (role, rest) = part
            .split_once('[')
            .ok_or_else(|| PathError::invalid_format(part))?;
        if role.is_empty() {
            return Err(PathError::invalid_format(part));
        }
        let content = rest
            .strip_suffix(']')
            .ok_or_else(|| PathError::invalid_format(part))?;
        let role = Role::from(role);
        match unquote(content) {
            Some(title) => Ok(PathComponent::ChildByRoleTitle {
                role,
                title: title.to_string(),
            }),
            None => content
                .parse::<usize>()
                .map(|index| PathComponent::ChildByRoleIndex { role, index })
                .map_err(|_| PathError::invalid_format(part)),
        }
    }
}

fn unquote(content: &str) -> Option<&str> {
    if content.len() >= 2 && content.starts_with('"') && content.ends_with('"') {
        Some(&content[1..content.len() - 1])
    } else {
        None
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathComponent::AppByPid(pid) => write!(f, "app({pid})"),
            PathComponent::AppByName(name) => write!(f, "app(\"{name}\")"),
            PathComponent::WindowByIndex(index) => write!(f, "window[{index}]"),
            PathComponent::WindowByTitle(title) => write!(f, "window[\"{title}\"]"),
            PathComponent::ChildByRoleIndex { role, index } => write!(f, "{role}[{index}]"),
            PathComponent::ChildByRoleTitle { role, title } => write!(f, "{role}[\"{title}\"]"),
        }
    }
}

/// Ordered, immutable sequence of path components
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementPath {
    components: Vec<PathComponent>,
}

impl ElementPath {
    /// Build a path from components without validating it
    pub fn new(components: Vec<PathComponent>) -> Self {
        Self { components }
    }

    /// Path of an application root
    pub fn app(pid: i32) -> Self {
        Self::new(vec![PathComponent::AppByPid(pid)])
    }

    pub fn parse(input: &str) -> Result<Self, PathError> {
        if input.is_empty() {
            return Err(PathError::EmptyPath);
        }

        let mut components = Vec::new();
        for (position, part) in input.split('/').enumerate() {
            let component = PathComponent::parse(part)?;
            if position > 0 && component.is_app_selector() {
                return Err(PathError::invalid_format(format!(
                    "app selector must be the first component: {part}"
                )));
            }
            components.push(component);
        }
        Ok(Self { components })
    }

    pub fn components(&self) -> &[PathComponent] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// A new path with `component` appended
    pub fn child(&self, component: PathComponent) -> Self {
        let mut components = self.components.clone();
        components.push(component);
        Self { components }
    }

    /// Process id of the leading app selector, if it is numeric
    pub fn app_pid(&self) -> Option<i32> {
        match self.components.first() {
            Some(PathComponent::AppByPid(pid)) => Some(*pid),
            _ => None,
        }
    }

    /// Structural checks done before any native call
    pub fn validate(&self) -> Result<(), PathError> {
        let first = self.components.first().ok_or(PathError::EmptyPath)?;
        if self.components.len() > MAX_PATH_COMPONENTS {
            return Err(PathError::PathTooLong(self.components.len()));
        }
        match first {
            PathComponent::AppByPid(pid) if *pid <= 0 => Err(PathError::InvalidPid(*pid)),
            PathComponent::AppByPid(_) | PathComponent::AppByName(_) => {
                if self.components[1..].iter().any(PathComponent::is_app_selector) {
                    return Err(PathError::invalid_format(
                        "app selector must be the first component",
                    ));
                }
                Ok(())
            }
            _ => Err(PathError::invalid_format("First component must be app")),
        }
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{component}")?;
        }
        Ok(())
    }
}

impl FromStr for ElementPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ElementPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ElementPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_examples_round_trip() {
        for s in [
            "app(1234)",
            "app(1234)/window[0]",
            "app(\"Finder\")/window[\"Doc1\"]",
            "app(1234)/window[0]/AXButton[\"Save\"]",
            "app(1234)/window[0]/AXButton[0]",
            "app(42)/AXWindow[1]/AXGroup[0]/AXCheckBox[\"Bold\"]",
        ] {
            let path = ElementPath::parse(s).unwrap();
            assert_eq!(path.to_string(), s);
        }
    }

    #[test]
    fn test_parse_components() {
        let path: ElementPath = "app(\"Finder\")/window[\"Doc1\"]/AXButton[2]".parse().unwrap();
        assert_eq!(
            path.components(),
            &[
                PathComponent::AppByName("Finder".to_string()),
                PathComponent::WindowByTitle("Doc1".to_string()),
                PathComponent::ChildByRoleIndex {
                    role: Role::Button,
                    index: 2
                },
            ]
        );
        assert_eq!(path.app_pid(), None);
    }

    #[test]
    fn test_custom_roles_and_odd_titles() {
        let path = ElementPath::parse("app(7)/AXSplitGroup[\"a]b[c\"]").unwrap();
        assert_eq!(
            path.components()[1],
            PathComponent::ChildByRoleTitle {
                role: Role::Custom("AXSplitGroup".to_string()),
                title: "a]b[c".to_string()
            }
        );
        assert_eq!(path.to_string(), "app(7)/AXSplitGroup[\"a]b[c\"]");

        let empty_title = ElementPath::parse("app(7)/window[\"\"]").unwrap();
        assert_eq!(
            empty_title.components()[1],
            PathComponent::WindowByTitle(String::new())
        );
    }

    #[test]
    fn test_empty_path() {
        assert_eq!(ElementPath::parse(""), Err(PathError::EmptyPath));
        assert_eq!(ElementPath::new(vec![]).validate(), Err(PathError::EmptyPath));
    }

    #[test]
    fn test_invalid_formats() {
        for s in [
            "app(abc)",
            "app(12",
            "window[x]",
            "window[-1]",
            "AXButton",
            "[0]",
            "AXButton[0",
            "app(1)//AXButton[0]",
            "app(1)/app(2)",
            "app(1)/AXButton[\"unterminated]",
        ] {
            assert!(
                matches!(ElementPath::parse(s), Err(PathError::InvalidFormat(_))),
                "{s} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_pid_bounds() {
        let path = ElementPath::parse("app(-1)").unwrap();
        assert_eq!(path.validate(), Err(PathError::InvalidPid(-1)));
        let path = ElementPath::parse("app(0)/window[0]").unwrap();
        assert_eq!(path.validate(), Err(PathError::InvalidPid(0)));
        assert_eq!(ElementPath::app(1).validate(), Ok(()));
    }

    #[test]
    fn test_validate_length_bound() {
        let mut path = ElementPath::app(1234);
        for i in 0..49 {
            path = path.child(PathComponent::ChildByRoleIndex {
                role: Role::Group,
                index: i,
            });
        }
        assert_eq!(path.len(), 50);
        assert_eq!(path.validate(), Ok(()));

        let path = path.child(PathComponent::WindowByIndex(0));
        let reparsed = ElementPath::parse(&path.to_string()).unwrap();
        assert_eq!(reparsed.validate(), Err(PathError::PathTooLong(51)));
    }

    #[test]
    fn test_validate_requires_leading_app() {
        let path = ElementPath::parse("window[0]/AXButton[0]").unwrap();
        assert!(matches!(path.validate(), Err(PathError::InvalidFormat(_))));
    }

    #[test]
    fn test_serde_as_string() {
        let path = ElementPath::parse("app(9)/window[\"Main\"]").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#""app(9)/window[\"Main\"]""#);
        let back: ElementPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
        assert!(serde_json::from_str::<ElementPath>(r#""""#).is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn title() -> impl Strategy<Value = String> {
            "[^/]{0,16}"
        }

        fn role() -> impl Strategy<Value = Role> {
            "AX[A-Za-z]{1,12}".prop_map(Role::from)
        }

        fn app_component() -> impl Strategy<Value = PathComponent> {
            prop_oneof![
                (1..i32::MAX).prop_map(PathComponent::AppByPid),
                title().prop_map(PathComponent::AppByName),
            ]
        }

        fn window_component() -> impl Strategy<Value = PathComponent> {
            prop_oneof![
                (0..1000usize).prop_map(PathComponent::WindowByIndex),
                title().prop_map(PathComponent::WindowByTitle),
            ]
        }

        fn child_component() -> impl Strategy<Value = PathComponent> {
            prop_oneof![
                (role(), 0..1000usize)
                    .prop_map(|(role, index)| PathComponent::ChildByRoleIndex { role, index }),
                (role(), title())
                    .prop_map(|(role, title)| PathComponent::ChildByRoleTitle { role, title }),
            ]
        }

        fn element_path() -> impl Strategy<Value = ElementPath> {
            (
                app_component(),
                proptest::option::of(window_component()),
                proptest::collection::vec(child_component(), 0..8),
            )
                .prop_map(|(app, window, children)| {
                    let mut components = vec![app];
                    components.extend(window);
                    components.extend(children);
                    ElementPath::new(components)
                })
        }

        proptest! {
            #[test]
            fn canonical_string_round_trips(path in element_path()) {
                let rendered = path.to_string();
                let reparsed = ElementPath::parse(&rendered).unwrap();
                prop_assert_eq!(&reparsed, &path);
                prop_assert_eq!(reparsed.to_string(), rendered);
            }
        }
    }
}
