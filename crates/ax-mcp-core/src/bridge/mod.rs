//! Seams to the platform accessibility layer
//!
//! The engine never talks to native APIs directly. It consumes three
//! collaborators:
//!
//! - [`AccessibilityBridge`]: synchronous reads, writes and actions on elements
//! - [`ObserverBridge`]: notification subscriptions driven by a worker thread
//! - [`AppResolver`]: app name / bundle id / pid to process id
//!
//! Element handles are opaque cookies handed out by the bridge. They may go
//! stale at any moment, so every bridge call is fallible.

pub mod names;

use crate::errors::{AccessibilityError, AppResolutionError};
use ax_mcp_protocol::{Point, Size};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

pub use names::{Action, Attribute, Notification, Role};

/// Result of a bridge call
pub type AxResult<T> = Result<T, AccessibilityError>;

/// Opaque reference to a native accessibility element
///
/// The engine does not own the element. Holding a handle says nothing about
/// whether it is still valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(u64);

impl ElementHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> u64 {
        self.0
    }
}

/// Typed attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Point(Point),
    Size(Size),
    Element(ElementHandle),
    Elements(Vec<ElementHandle>),
}

impl AttributeValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::String(_) => "string",
            AttributeValue::Bool(_) => "bool",
            AttributeValue::Int(_) => "int",
            AttributeValue::Float(_) => "float",
            AttributeValue::Point(_) => "point",
            AttributeValue::Size(_) => "size",
            AttributeValue::Element(_) => "element",
            AttributeValue::Elements(_) => "elements",
        }
    }

    pub fn into_string(self) -> AxResult<String> {
        match self {
            AttributeValue::String(s) => Ok(s),
            other => Err(AccessibilityError::type_mismatch("string", other.type_name())),
        }
    }

    pub fn as_bool(&self) -> AxResult<bool> {
        match self {
            AttributeValue::Bool(b) => Ok(*b),
            other => Err(AccessibilityError::type_mismatch("bool", other.type_name())),
        }
    }

    pub fn as_point(&self) -> AxResult<Point> {
        match self {
            AttributeValue::Point(p) => Ok(*p),
            other => Err(AccessibilityError::type_mismatch("point", other.type_name())),
        }
    }

    pub fn as_size(&self) -> AxResult<Size> {
        match self {
            AttributeValue::Size(s) => Ok(*s),
            other => Err(AccessibilityError::type_mismatch("size", other.type_name())),
        }
    }

    pub fn into_element(self) -> AxResult<ElementHandle> {
        match self {
            AttributeValue::Element(e) => Ok(e),
            other => Err(AccessibilityError::type_mismatch("element", other.type_name())),
        }
    }

    pub fn into_elements(self) -> AxResult<Vec<ElementHandle>> {
        match self {
            AttributeValue::Elements(e) => Ok(e),
            other => Err(AccessibilityError::type_mismatch("elements", other.type_name())),
        }
    }

    /// Text form used for `value` fields in snapshots and responses
    ///
    /// Element references have no display form.
    pub fn display_value(&self) -> Option<String> {
        match self {
            AttributeValue::String(s) => Some(s.clone()),
            AttributeValue::Bool(b) => Some(b.to_string()),
            AttributeValue::Int(i) => Some(i.to_string()),
            AttributeValue::Float(f) => Some(f.to_string()),
            AttributeValue::Point(p) => Some(format!("{{{}, {}}}", p.x, p.y)),
            AttributeValue::Size(s) => Some(format!("{{{}, {}}}", s.width, s.height)),
            AttributeValue::Element(_) | AttributeValue::Elements(_) => None,
        }
    }

    /// Convert a JSON scalar into an attribute value
    ///
    /// Objects with `x`/`y` become points and objects with `width`/`height`
    /// become sizes. Arrays and nulls have no attribute form.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::String(s) => Some(AttributeValue::String(s.clone())),
            JsonValue::Bool(b) => Some(AttributeValue::Bool(*b)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Some(AttributeValue::Int(i)),
                None => n.as_f64().map(AttributeValue::Float),
            },
            JsonValue::Object(map) => {
                let num = |key: &str| map.get(key).and_then(JsonValue::as_f64);
                if let (Some(x), Some(y)) = (num("x"), num("y")) {
                    Some(AttributeValue::Point(Point { x, y }))
                } else if let (Some(width), Some(height)) = (num("width"), num("height")) {
                    Some(AttributeValue::Size(Size { width, height }))
                } else {
                    None
                }
            }
            JsonValue::Null | JsonValue::Array(_) => None,
        }
    }
}

/// Synchronous operations on native accessibility elements
pub trait AccessibilityBridge: Send + Sync {
    /// Root element of a running application
    fn create_app_root(&self, pid: i32) -> AxResult<ElementHandle>;

    /// System-wide root element
    fn create_system_root(&self) -> AxResult<ElementHandle>;

    fn attribute(&self, name: &Attribute, element: ElementHandle) -> AxResult<AttributeValue>;

    fn set_attribute(
        &self,
        name: &Attribute,
        value: AttributeValue,
        element: ElementHandle,
    ) -> AxResult<()>;

    fn attribute_names(&self, element: ElementHandle) -> AxResult<Vec<Attribute>>;

    fn action_names(&self, element: ElementHandle) -> AxResult<Vec<Action>>;

    fn perform_action(&self, action: &Action, element: ElementHandle) -> AxResult<()>;

    fn children(&self, element: ElementHandle) -> AxResult<Vec<ElementHandle>>;

    fn windows(&self, element: ElementHandle) -> AxResult<Vec<ElementHandle>>;

    fn string_attribute(&self, name: &Attribute, element: ElementHandle) -> AxResult<String> {
        self.attribute(name, element)?.into_string()
    }

    fn bool_attribute(&self, name: &Attribute, element: ElementHandle) -> AxResult<bool> {
        self.attribute(name, element)?.as_bool()
    }

    fn element_attribute(
        &self,
        name: &Attribute,
        element: ElementHandle,
    ) -> AxResult<ElementHandle> {
        self.attribute(name, element)?.into_element()
    }

    fn role(&self, element: ElementHandle) -> AxResult<Role> {
        self.string_attribute(&Attribute::Role, element).map(Role::from)
    }
}

/// A notification as delivered by the platform, before translation
#[derive(Debug, Clone, PartialEq)]
pub struct RawNotification {
    pub name: Notification,
    pub element: Option<ElementHandle>,
}

/// Callback invoked on the observation worker thread for each notification
pub type NotificationCallback = Arc<dyn Fn(RawNotification) + Send + Sync>;

/// Token for one native notification registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeSession(u64);

impl NativeSession {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> u64 {
        self.0
    }
}

/// Outcome of one event-loop slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpStatus {
    /// The registration is live; keep pumping
    Running,
    /// The target process is gone or the registration was dropped
    Terminated,
}

/// Native notification subscriptions
///
/// `subscribe`, `pump` and `unsubscribe` for one session are always called
/// from the same worker thread, which plays the role of the platform run loop.
pub trait ObserverBridge: Send + Sync {
    fn subscribe(
        &self,
        pid: i32,
        element: Option<ElementHandle>,
        notifications: &[Notification],
        callback: NotificationCallback,
    ) -> AxResult<NativeSession>;

    /// Deliver pending notifications, waiting at most `timeout` for new ones
    fn pump(&self, session: NativeSession, timeout: Duration) -> PumpStatus;

    /// Remove the registration; unknown sessions are ignored
    fn unsubscribe(&self, session: NativeSession);
}

/// A running application as seen by the resolver
#[derive(Debug, Clone, PartialEq)]
pub struct RunningApplication {
    pub pid: i32,
    pub name: String,
    pub bundle_id: Option<String>,
}

/// Maps app identifiers to process ids
pub trait AppResolver: Send + Sync {
    fn running_applications(&self) -> Vec<RunningApplication>;

    /// Resolve a numeric pid, app name or bundle id
    ///
    /// Positive integers are taken as pids without enumerating processes.
    fn resolve(&self, identifier: &str) -> Result<i32, AppResolutionError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(AppResolutionError::InvalidIdentifier(identifier.to_string()));
        }
        if let Ok(pid) = identifier.parse::<i32>() {
            if pid > 0 {
                return Ok(pid);
            }
            return Err(AppResolutionError::InvalidIdentifier(identifier.to_string()));
        }

        let matches: Vec<RunningApplication> = self
            .running_applications()
            .into_iter()
            .filter(|app| {
                app.name == identifier || app.bundle_id.as_deref() == Some(identifier)
            })
            .collect();

        match matches.as_slice() {
            [] => Err(AppResolutionError::not_running(identifier)),
            [only] => Ok(only.pid),
            many => Err(AppResolutionError::MultipleMatches {
                app: identifier.to_string(),
                matches: many.iter().map(|app| app.name.clone()).collect(),
            }),
        }
    }
}
