//! Open name sets for roles, attributes, actions and notifications
//!
//! Each set is a closed list of well-known wire names plus a `Custom`
//! fallback. Converting from a string never fails: unknown names become
//! `Custom(name)`, and `as_str` returns the original wire name.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! open_name_set {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident => $wire:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $variant, )+
            /// Any name outside the well-known set
            Custom(String),
        }

        impl $name {
            /// Wire name understood by the platform
            pub fn as_str(&self) -> &str {
                match self {
                    $( $name::$variant => $wire, )+
                    $name::Custom(name) => name.as_str(),
                }
            }

            pub fn is_custom(&self) -> bool {
                matches!(self, $name::Custom(_))
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                match name {
                    $( $wire => $name::$variant, )+
                    other => $name::Custom(other.to_string()),
                }
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self::from(name.as_str())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                String::deserialize(deserializer).map(Self::from)
            }
        }
    };
}

open_name_set! {
    /// Semantic type of an element
    pub enum Role {
        Application => "AXApplication",
        Window => "AXWindow",
        Button => "AXButton",
        TextField => "AXTextField",
        StaticText => "AXStaticText",
        CheckBox => "AXCheckBox",
        Menu => "AXMenu",
        MenuItem => "AXMenuItem",
        Group => "AXGroup",
        Toolbar => "AXToolbar",
        List => "AXList",
        Table => "AXTable",
        Cell => "AXCell",
    }
}

open_name_set! {
    /// Named property of an element
    pub enum Attribute {
        Role => "AXRole",
        Title => "AXTitle",
        Description => "AXDescription",
        Value => "AXValue",
        Children => "AXChildren",
        Parent => "AXParent",
        Enabled => "AXEnabled",
        Focused => "AXFocused",
        Position => "AXPosition",
        Size => "AXSize",
        Identifier => "AXIdentifier",
        RoleDescription => "AXRoleDescription",
        Subrole => "AXSubrole",
        Windows => "AXWindows",
        FocusedWindow => "AXFocusedWindow",
        MainWindow => "AXMainWindow",
        FocusedUiElement => "AXFocusedUIElement",
        Minimized => "AXMinimized",
    }
}

open_name_set! {
    /// Operation an element can perform
    pub enum Action {
        Press => "AXPress",
        Pick => "AXPick",
        ShowMenu => "AXShowMenu",
        Confirm => "AXConfirm",
        Cancel => "AXCancel",
        Raise => "AXRaise",
        Increment => "AXIncrement",
        Decrement => "AXDecrement",
    }
}

open_name_set! {
    /// Asynchronous change notification
    pub enum Notification {
        ValueChanged => "AXValueChanged",
        FocusedUiElementChanged => "AXFocusedUIElementChanged",
        WindowCreated => "AXWindowCreated",
        UiElementDestroyed => "AXUIElementDestroyed",
        TitleChanged => "AXTitleChanged",
    }
}

impl Action {
    /// Actions the write tools are allowed to invoke
    pub const PERMITTED: [Action; 8] = [
        Action::Press,
        Action::Pick,
        Action::ShowMenu,
        Action::Confirm,
        Action::Cancel,
        Action::Raise,
        Action::Increment,
        Action::Decrement,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_names_map_to_variants() {
        assert_eq!(Role::from("AXButton"), Role::Button);
        assert_eq!(Attribute::from("AXFocusedUIElement"), Attribute::FocusedUiElement);
        assert_eq!(Action::from("AXShowMenu"), Action::ShowMenu);
        assert_eq!(
            Notification::from("AXUIElementDestroyed"),
            Notification::UiElementDestroyed
        );
    }

    #[test]
    fn test_unknown_names_become_custom() {
        let role = Role::from("Application");
        assert_eq!(role, Role::Custom("Application".to_string()));
        assert!(role.is_custom());
        assert_eq!(role.as_str(), "Application");

        let attr = Attribute::from("AXBundleIdentifier");
        assert_eq!(attr.to_string(), "AXBundleIdentifier");
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&vec![Action::Press, Action::from("AXScrollToVisible")])
            .unwrap();
        assert_eq!(json, r#"["AXPress","AXScrollToVisible"]"#);

        let roles: Vec<Role> = serde_json::from_str(r#"["AXWindow","AXSplitGroup"]"#).unwrap();
        assert_eq!(roles[0], Role::Window);
        assert_eq!(roles[1], Role::Custom("AXSplitGroup".to_string()));
    }

    #[test]
    fn test_permitted_actions_are_well_known() {
        assert!(Action::PERMITTED.iter().all(|a| !a.is_custom()));
        assert!(!Action::PERMITTED.contains(&Action::from("AXScrollToVisible")));
    }
}
