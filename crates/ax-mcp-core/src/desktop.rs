//! In-memory accessibility desktop
//!
//! [`InMemoryDesktop`] implements every bridge trait over an arena of
//! elements built from [`ElementSpec`] trees. The server loads one from a
//! JSON fixture; the test suites build them programmatically.
//!
//! Handles are arena indices. Removing an element or terminating its
//! application leaves the handle in place but marks it dead, so later calls
//! fail with [`AccessibilityError::InvalidElement`] like a stale native
//! reference would.

use crate::bridge::{
    AccessibilityBridge, Action, AppResolver, Attribute, AttributeValue, AxResult, ElementHandle,
    NativeSession, Notification, NotificationCallback, ObserverBridge, PumpStatus,
    RawNotification, Role, RunningApplication,
};
use crate::constants::BUNDLE_IDENTIFIER_ATTRIBUTE;
use crate::errors::{AccessibilityError, PathError};
use crate::path::{ElementPath, resolve};
use ax_mcp_protocol::{Point, Size};
use parking_lot::{Condvar, Mutex};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Declarative description of one element and its subtree
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementSpec {
    pub role: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub value: Option<JsonValue>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub position: Option<Point>,
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default)]
    pub minimized: Option<bool>,
    #[serde(default)]
    pub actions: Vec<String>,
    /// Extra attributes by wire name
    #[serde(default)]
    pub attributes: BTreeMap<String, JsonValue>,
    /// List this element in the application's window list
    #[serde(default)]
    pub window: bool,
    #[serde(default)]
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn value(mut self, value: impl Into<JsonValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn as_window(mut self) -> Self {
        self.window = true;
        self
    }

    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = ElementSpec>) -> Self {
        self.children.extend(children);
        self
    }
}

/// A running application and its element tree
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicationSpec {
    pub pid: i32,
    pub name: String,
    #[serde(default)]
    pub bundle_id: Option<String>,
    pub root: ElementSpec,
}

impl ApplicationSpec {
    pub fn new(pid: i32, name: impl Into<String>, root: ElementSpec) -> Self {
        Self {
            pid,
            name: name.into(),
            bundle_id: None,
            root,
        }
    }

    pub fn bundle_id(mut self, bundle_id: impl Into<String>) -> Self {
        self.bundle_id = Some(bundle_id.into());
        self
    }
}

/// Fixture file contents
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DesktopSpec {
    #[serde(default)]
    pub applications: Vec<ApplicationSpec>,
    /// Path of the initially focused element
    #[serde(default)]
    pub focused: Option<String>,
}

/// Errors loading a desktop fixture
#[derive(Debug, Error)]
pub enum DesktopError {
    #[error("Failed to read fixture: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid fixture JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Process id {0} is used by more than one application")]
    DuplicatePid(i32),

    #[error("Invalid process id {0}")]
    InvalidPid(i32),

    #[error("Focused element: {0}")]
    Focus(#[from] PathError),
}

struct Node {
    pid: i32,
    parent: Option<ElementHandle>,
    attributes: BTreeMap<Attribute, AttributeValue>,
    actions: Vec<Action>,
    children: Vec<ElementHandle>,
    windows: Vec<ElementHandle>,
    alive: bool,
}

struct Application {
    pid: i32,
    name: String,
    bundle_id: Option<String>,
    root: ElementHandle,
    terminated: bool,
}

struct Subscription {
    pid: i32,
    element: Option<ElementHandle>,
    notifications: HashSet<Notification>,
    callback: NotificationCallback,
    queue: VecDeque<RawNotification>,
    terminated: bool,
}

struct DesktopState {
    nodes: Vec<Node>,
    applications: Vec<Application>,
    system_root: ElementHandle,
    focused: Option<ElementHandle>,
    subscriptions: HashMap<NativeSession, Subscription>,
    performed: Vec<(ElementHandle, Action)>,
}

/// Arena-backed desktop implementing the bridge traits
pub struct InMemoryDesktop {
    state: Mutex<DesktopState>,
    wakeup: Condvar,
    next_session: AtomicU64,
    permission_denied: AtomicBool,
    latency_micros: AtomicU64,
}

impl Default for InMemoryDesktop {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDesktop {
    /// An empty desktop with only the system-wide element
    pub fn new() -> Self {
        let system = Node {
            pid: 0,
            parent: None,
            attributes: BTreeMap::from([(
                Attribute::Role,
                AttributeValue::String("AXSystemWide".to_string()),
            )]),
            actions: Vec::new(),
            children: Vec::new(),
            windows: Vec::new(),
            alive: true,
        };
        Self {
            state: Mutex::new(DesktopState {
                nodes: vec![system],
                applications: Vec::new(),
                system_root: ElementHandle::from_raw(0),
                focused: None,
                subscriptions: HashMap::new(),
                performed: Vec::new(),
            }),
            wakeup: Condvar::new(),
            next_session: AtomicU64::new(1),
            permission_denied: AtomicBool::new(false),
            latency_micros: AtomicU64::new(0),
        }
    }

    pub fn from_spec(spec: DesktopSpec) -> Result<Self, DesktopError> {
        let desktop = Self::new();
        for app in spec.applications {
            desktop.insert_application(app)?;
        }
        if let Some(focused) = spec.focused {
            let path = ElementPath::parse(&focused)?;
            let element = resolve(&path, &desktop, None)?;
            desktop.state.lock().focused = Some(element);
        }
        Ok(desktop)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DesktopError> {
        let raw = std::fs::read_to_string(path)?;
        let spec: DesktopSpec = serde_json::from_str(&raw)?;
        Self::from_spec(spec)
    }

    /// Add a running application, returning its root element
    pub fn insert_application(&self, spec: ApplicationSpec) -> Result<ElementHandle, DesktopError> {
        if spec.pid <= 0 {
            return Err(DesktopError::InvalidPid(spec.pid));
        }
        let mut state = self.state.lock();
        if state
            .applications
            .iter()
            .any(|app| app.pid == spec.pid && !app.terminated)
        {
            return Err(DesktopError::DuplicatePid(spec.pid));
        }

        let root = state.build(spec.pid, None, &spec.root);
        if let Some(bundle_id) = &spec.bundle_id {
            state.node_mut(root).attributes.insert(
                Attribute::from(BUNDLE_IDENTIFIER_ATTRIBUTE),
                AttributeValue::String(bundle_id.clone()),
            );
        }
        state.applications.push(Application {
            pid: spec.pid,
            name: spec.name,
            bundle_id: spec.bundle_id,
            root,
            terminated: false,
        });
        tracing::debug!(target: "ax_mcp::bridge", pid = spec.pid, "application added");
        Ok(root)
    }

    /// Add a window to a running application
    pub fn open_window(&self, pid: i32, spec: ElementSpec) -> AxResult<ElementHandle> {
        let mut state = self.state.lock();
        let root = state.app(pid).ok_or(AccessibilityError::InvalidElement)?.root;
        let window = state.build(pid, Some(root), &spec);
        let root_node = state.node_mut(root);
        root_node.children.push(window);
        if !root_node.windows.contains(&window) {
            root_node.windows.push(window);
        }
        state.emit(window, Notification::WindowCreated);
        drop(state);
        self.wakeup.notify_all();
        Ok(window)
    }

    /// Destroy an element and its subtree
    pub fn remove_element(&self, element: ElementHandle) -> AxResult<()> {
        let mut state = self.state.lock();
        state.live_node(element)?;
        state.emit(element, Notification::UiElementDestroyed);
        state.kill(element);
        drop(state);
        self.wakeup.notify_all();
        Ok(())
    }

    /// Simulate the process exiting
    pub fn terminate(&self, pid: i32) {
        let mut state = self.state.lock();
        let Some(root) = state.app(pid).map(|app| app.root) else {
            return;
        };
        state.kill(root);
        for app in state.applications.iter_mut().filter(|app| app.pid == pid) {
            app.terminated = true;
        }
        for subscription in state.subscriptions.values_mut() {
            if subscription.pid == pid {
                subscription.terminated = true;
            }
        }
        drop(state);
        tracing::debug!(target: "ax_mcp::bridge", pid, "application terminated");
        self.wakeup.notify_all();
    }

    /// Deliver a notification for `element` to matching subscriptions
    pub fn post_notification(&self, element: ElementHandle, notification: Notification) {
        self.state.lock().emit(element, notification);
        self.wakeup.notify_all();
    }

    pub fn set_permission_denied(&self, denied: bool) {
        self.permission_denied.store(denied, Ordering::SeqCst);
    }

    /// Delay every element operation, to exercise deadlines
    pub fn set_latency(&self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.latency_micros.store(micros, Ordering::SeqCst);
    }

    /// Actions performed so far, in order
    pub fn performed_actions(&self) -> Vec<(ElementHandle, Action)> {
        self.state.lock().performed.clone()
    }

    /// Number of live notification registrations
    pub fn active_subscriptions(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    fn enter(&self) -> AxResult<()> {
        let micros = self.latency_micros.load(Ordering::SeqCst);
        if micros > 0 {
            std::thread::sleep(Duration::from_micros(micros));
        }
        if self.permission_denied.load(Ordering::SeqCst) {
            return Err(AccessibilityError::permission_denied());
        }
        Ok(())
    }
}

impl DesktopState {
    fn build(&mut self, pid: i32, parent: Option<ElementHandle>, spec: &ElementSpec) -> ElementHandle {
        let handle = ElementHandle::from_raw(self.nodes.len() as u64);

        let mut attributes = BTreeMap::new();
        attributes.insert(Attribute::Role, AttributeValue::String(spec.role.clone()));
        if let Some(title) = &spec.title {
            attributes.insert(Attribute::Title, AttributeValue::String(title.clone()));
        }
        if let Some(value) = spec.value.as_ref().and_then(AttributeValue::from_json) {
            attributes.insert(Attribute::Value, value);
        }
        if let Some(identifier) = &spec.identifier {
            attributes.insert(Attribute::Identifier, AttributeValue::String(identifier.clone()));
        }
        if let Some(enabled) = spec.enabled {
            attributes.insert(Attribute::Enabled, AttributeValue::Bool(enabled));
        }
        if let Some(position) = spec.position {
            attributes.insert(Attribute::Position, AttributeValue::Point(position));
        }
        if let Some(size) = spec.size {
            attributes.insert(Attribute::Size, AttributeValue::Size(size));
        }
        if let Some(minimized) = spec.minimized {
            attributes.insert(Attribute::Minimized, AttributeValue::Bool(minimized));
        }
        for (name, raw) in &spec.attributes {
            match AttributeValue::from_json(raw) {
                Some(value) => {
                    attributes.insert(Attribute::from(name.as_str()), value);
                }
                None => tracing::warn!(
                    target: "ax_mcp::bridge",
                    attribute = %name,
                    "ignoring fixture attribute without a scalar value"
                ),
            }
        }

        self.nodes.push(Node {
            pid,
            parent,
            attributes,
            actions: spec.actions.iter().map(|a| Action::from(a.as_str())).collect(),
            children: Vec::new(),
            windows: Vec::new(),
            alive: true,
        });

        let is_root = parent.is_none();
        for child_spec in &spec.children {
            let child = self.build(pid, Some(handle), child_spec);
            let node = self.node_mut(handle);
            node.children.push(child);
            if is_root && (child_spec.window || Role::from(child_spec.role.as_str()) == Role::Window) {
                node.windows.push(child);
            }
        }
        handle
    }

    fn node(&self, element: ElementHandle) -> Option<&Node> {
        usize::try_from(element.into_raw())
            .ok()
            .and_then(|index| self.nodes.get(index))
    }

    fn node_mut(&mut self, element: ElementHandle) -> &mut Node {
        let index = element.into_raw() as usize;
        &mut self.nodes[index]
    }

    fn live_node(&self, element: ElementHandle) -> AxResult<&Node> {
        self.node(element)
            .filter(|node| node.alive)
            .ok_or(AccessibilityError::InvalidElement)
    }

    fn app(&self, pid: i32) -> Option<&Application> {
        self.applications
            .iter()
            .find(|app| app.pid == pid && !app.terminated)
    }

    fn kill(&mut self, element: ElementHandle) {
        let mut pending = vec![element];
        while let Some(current) = pending.pop() {
            let node = self.node_mut(current);
            node.alive = false;
            pending.extend(node.children.iter().copied());
        }
        if self.focused.is_some_and(|focused| !self.is_alive(focused)) {
            self.focused = None;
        }
    }

    fn is_alive(&self, element: ElementHandle) -> bool {
        self.node(element).is_some_and(|node| node.alive)
    }

    fn live(&self, elements: &[ElementHandle]) -> Vec<ElementHandle> {
        elements
            .iter()
            .copied()
            .filter(|element| self.is_alive(*element))
            .collect()
    }

    fn is_within(&self, element: ElementHandle, ancestor: ElementHandle) -> bool {
        let mut current = Some(element);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.node(handle).and_then(|node| node.parent);
        }
        false
    }

    fn emit(&mut self, element: ElementHandle, notification: Notification) {
        let Some(pid) = self.node(element).map(|node| node.pid) else {
            return;
        };
        let targets: Vec<NativeSession> = self
            .subscriptions
            .iter()
            .filter(|(_, sub)| {
                sub.pid == pid
                    && !sub.terminated
                    && sub.notifications.contains(&notification)
                    && sub.element.is_none_or(|scope| self.is_within(element, scope))
            })
            .map(|(session, _)| *session)
            .collect();
        for session in targets {
            if let Some(sub) = self.subscriptions.get_mut(&session) {
                sub.queue.push_back(RawNotification {
                    name: notification.clone(),
                    element: Some(element),
                });
            }
        }
    }

    fn focused_within(&self, element: ElementHandle) -> Option<ElementHandle> {
        let focused = self.focused?;
        if element == self.system_root || self.is_within(focused, element) {
            Some(focused)
        } else {
            None
        }
    }

    fn set_focus(&mut self, element: ElementHandle) {
        if self.focused != Some(element) {
            self.focused = Some(element);
            self.emit(element, Notification::FocusedUiElementChanged);
        }
    }
}

fn step_value(value: Option<&AttributeValue>, delta: i64) -> Option<AttributeValue> {
    match value? {
        AttributeValue::Int(i) => Some(AttributeValue::Int(i.saturating_add(delta))),
        AttributeValue::Float(f) => Some(AttributeValue::Float(f + delta as f64)),
        _ => None,
    }
}

fn toggled(value: Option<&AttributeValue>) -> AttributeValue {
    match value {
        Some(AttributeValue::Bool(b)) => AttributeValue::Bool(!b),
        Some(AttributeValue::Int(0)) | None => AttributeValue::Int(1),
        Some(_) => AttributeValue::Int(0),
    }
}

impl AccessibilityBridge for InMemoryDesktop {
    fn create_app_root(&self, pid: i32) -> AxResult<ElementHandle> {
        self.enter()?;
        let state = self.state.lock();
        state
            .app(pid)
            .map(|app| app.root)
            .ok_or(AccessibilityError::InvalidElement)
    }

    fn create_system_root(&self) -> AxResult<ElementHandle> {
        self.enter()?;
        Ok(self.state.lock().system_root)
    }

    fn attribute(&self, name: &Attribute, element: ElementHandle) -> AxResult<AttributeValue> {
        self.enter()?;
        let state = self.state.lock();
        let node = state.live_node(element)?;
        match name {
            Attribute::Children => Ok(AttributeValue::Elements(state.live(&node.children))),
            Attribute::Windows => Ok(AttributeValue::Elements(state.live(&node.windows))),
            Attribute::Parent => node
                .parent
                .map(AttributeValue::Element)
                .ok_or(AccessibilityError::NoValue),
            Attribute::Focused => Ok(AttributeValue::Bool(state.focused == Some(element))),
            Attribute::FocusedUiElement => state
                .focused_within(element)
                .map(AttributeValue::Element)
                .ok_or(AccessibilityError::NoValue),
            other => node
                .attributes
                .get(other)
                .cloned()
                .ok_or_else(|| AccessibilityError::AttributeUnsupported(other.to_string())),
        }
    }

    fn set_attribute(
        &self,
        name: &Attribute,
        value: AttributeValue,
        element: ElementHandle,
    ) -> AxResult<()> {
        self.enter()?;
        let mut state = self.state.lock();
        let node = state.live_node(element)?;
        if node.attributes.get(&Attribute::Enabled) == Some(&AttributeValue::Bool(false)) {
            return Err(AccessibilityError::CannotComplete);
        }

        match name {
            Attribute::Focused => {
                if value.as_bool()? {
                    state.set_focus(element);
                } else if state.focused == Some(element) {
                    state.focused = None;
                }
            }
            Attribute::Role | Attribute::Children | Attribute::Parent | Attribute::Windows => {
                return Err(AccessibilityError::AttributeUnsupported(name.to_string()));
            }
            Attribute::Value => {
                if !node.attributes.contains_key(&Attribute::Value) {
                    return Err(AccessibilityError::AttributeUnsupported(name.to_string()));
                }
                state.node_mut(element).attributes.insert(Attribute::Value, value);
                state.emit(element, Notification::ValueChanged);
            }
            Attribute::Title => {
                state.node_mut(element).attributes.insert(Attribute::Title, value);
                state.emit(element, Notification::TitleChanged);
            }
            other => {
                state.node_mut(element).attributes.insert(other.clone(), value);
            }
        }
        drop(state);
        self.wakeup.notify_all();
        Ok(())
    }

    fn attribute_names(&self, element: ElementHandle) -> AxResult<Vec<Attribute>> {
        self.enter()?;
        let state = self.state.lock();
        let node = state.live_node(element)?;
        let mut names: Vec<Attribute> = node.attributes.keys().cloned().collect();
        for implicit in [Attribute::Children, Attribute::Parent, Attribute::Focused] {
            if !names.contains(&implicit) {
                names.push(implicit);
            }
        }
        Ok(names)
    }

    fn action_names(&self, element: ElementHandle) -> AxResult<Vec<Action>> {
        self.enter()?;
        let state = self.state.lock();
        Ok(state.live_node(element)?.actions.clone())
    }

    fn perform_action(&self, action: &Action, element: ElementHandle) -> AxResult<()> {
        self.enter()?;
        let mut state = self.state.lock();
        let node = state.live_node(element)?;
        if !node.actions.contains(action) {
            return Err(AccessibilityError::ActionUnsupported(action.to_string()));
        }
        if node.attributes.get(&Attribute::Enabled) == Some(&AttributeValue::Bool(false)) {
            return Err(AccessibilityError::CannotComplete);
        }

        let role = node
            .attributes
            .get(&Attribute::Role)
            .and_then(|r| r.clone().into_string().ok())
            .map(Role::from);
        let current = node.attributes.get(&Attribute::Value);
        let updated = match action {
            Action::Increment => step_value(current, 1),
            Action::Decrement => step_value(current, -1),
            Action::Press if role == Some(Role::CheckBox) => Some(toggled(current)),
            _ => None,
        };

        if let Some(value) = updated {
            state.node_mut(element).attributes.insert(Attribute::Value, value);
            state.emit(element, Notification::ValueChanged);
        }
        if *action == Action::Raise || *action == Action::Press {
            state.set_focus(element);
        }
        state.performed.push((element, action.clone()));
        drop(state);
        self.wakeup.notify_all();
        Ok(())
    }

    fn children(&self, element: ElementHandle) -> AxResult<Vec<ElementHandle>> {
        self.enter()?;
        let state = self.state.lock();
        let node = state.live_node(element)?;
        Ok(state.live(&node.children))
    }

    fn windows(&self, element: ElementHandle) -> AxResult<Vec<ElementHandle>> {
        self.enter()?;
        let state = self.state.lock();
        let node = state.live_node(element)?;
        Ok(state.live(&node.windows))
    }
}

impl ObserverBridge for InMemoryDesktop {
    fn subscribe(
        &self,
        pid: i32,
        element: Option<ElementHandle>,
        notifications: &[Notification],
        callback: NotificationCallback,
    ) -> AxResult<NativeSession> {
        if self.permission_denied.load(Ordering::SeqCst) {
            return Err(AccessibilityError::permission_denied());
        }
        let mut state = self.state.lock();
        if state.app(pid).is_none() {
            return Err(AccessibilityError::InvalidElement);
        }
        if let Some(scope) = element {
            state.live_node(scope)?;
        }
        if let Some(unsupported) = notifications.iter().find(|n| n.is_custom()) {
            return Err(AccessibilityError::NotificationUnsupported(
                unsupported.to_string(),
            ));
        }

        let session = NativeSession::from_raw(self.next_session.fetch_add(1, Ordering::SeqCst));
        state.subscriptions.insert(
            session,
            Subscription {
                pid,
                element,
                notifications: notifications.iter().cloned().collect(),
                callback,
                queue: VecDeque::new(),
                terminated: false,
            },
        );
        tracing::debug!(target: "ax_mcp::bridge", pid, ?session, "subscribed");
        Ok(session)
    }

    fn pump(&self, session: NativeSession, timeout: Duration) -> PumpStatus {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            let Some(sub) = state.subscriptions.get_mut(&session) else {
                return PumpStatus::Terminated;
            };
            if !sub.queue.is_empty() {
                let pending: Vec<RawNotification> = sub.queue.drain(..).collect();
                let callback = Arc::clone(&sub.callback);
                drop(state);
                for notification in pending {
                    callback(notification);
                }
                return PumpStatus::Running;
            }
            if sub.terminated {
                return PumpStatus::Terminated;
            }
            if self.wakeup.wait_until(&mut state, deadline).timed_out() {
                return PumpStatus::Running;
            }
        }
    }

    fn unsubscribe(&self, session: NativeSession) {
        if self.state.lock().subscriptions.remove(&session).is_some() {
            tracing::debug!(target: "ax_mcp::bridge", ?session, "unsubscribed");
        }
    }
}

impl AppResolver for InMemoryDesktop {
    fn running_applications(&self) -> Vec<RunningApplication> {
        self.state
            .lock()
            .applications
            .iter()
            .filter(|app| !app.terminated)
            .map(|app| RunningApplication {
                pid: app.pid,
                name: app.name.clone(),
                bundle_id: app.bundle_id.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    fn finder() -> (InMemoryDesktop, ElementHandle) {
        let desktop = InMemoryDesktop::new();
        let root = desktop
            .insert_application(
                ApplicationSpec::new(
                    1234,
                    "Finder",
                    ElementSpec::new("AXApplication").title("Finder").child(
                        ElementSpec::new("AXWindow").title("Downloads").child(
                            ElementSpec::new("AXCheckBox")
                                .title("Show hidden")
                                .value(0)
                                .actions(["AXPress"]),
                        ),
                    ),
                )
                .bundle_id("com.apple.finder"),
            )
            .unwrap();
        (desktop, root)
    }

    #[test]
    fn test_fixture_json_loads() {
        let spec: DesktopSpec = serde_json::from_str(
            r#"{
                "applications": [{
                    "pid": 501,
                    "name": "Notes",
                    "bundle_id": "com.apple.Notes",
                    "root": {
                        "role": "AXApplication",
                        "children": [{
                            "role": "AXWindow",
                            "title": "Notes",
                            "position": {"x": 10, "y": 20},
                            "children": [{"role": "AXTextField", "value": "draft", "actions": ["AXConfirm"]}]
                        }]
                    }
                }],
                "focused": "app(501)/window[0]/AXTextField[0]"
            }"#,
        )
        .unwrap();
        let desktop = InMemoryDesktop::from_spec(spec).unwrap();

        let system = desktop.create_system_root().unwrap();
        let focused = desktop
            .element_attribute(&Attribute::FocusedUiElement, system)
            .unwrap();
        assert_eq!(
            desktop.string_attribute(&Attribute::Value, focused).unwrap(),
            "draft"
        );
        assert_eq!(desktop.resolve("com.apple.Notes"), Ok(501));
    }

    #[test]
    fn test_unknown_fixture_fields_are_rejected() {
        let result = serde_json::from_str::<DesktopSpec>(r#"{"apps": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_pid_rejected() {
        let (desktop, _) = finder();
        let err = desktop
            .insert_application(ApplicationSpec::new(1234, "Other", ElementSpec::new("AXApplication")))
            .unwrap_err();
        assert!(matches!(err, DesktopError::DuplicatePid(1234)));
    }

    #[test]
    fn test_bundle_identifier_attribute() {
        let (desktop, root) = finder();
        assert_eq!(
            desktop
                .string_attribute(&Attribute::from(BUNDLE_IDENTIFIER_ATTRIBUTE), root)
                .unwrap(),
            "com.apple.finder"
        );
    }

    #[test]
    fn test_press_toggles_checkbox() {
        let (desktop, root) = finder();
        let window = desktop.windows(root).unwrap()[0];
        let checkbox = desktop.children(window).unwrap()[0];

        desktop.perform_action(&Action::Press, checkbox).unwrap();
        assert_eq!(
            desktop.attribute(&Attribute::Value, checkbox).unwrap(),
            AttributeValue::Int(1)
        );
        assert!(desktop.bool_attribute(&Attribute::Focused, checkbox).unwrap());
        assert_eq!(desktop.performed_actions(), vec![(checkbox, Action::Press)]);

        assert_eq!(
            desktop.perform_action(&Action::Increment, checkbox),
            Err(AccessibilityError::ActionUnsupported("AXIncrement".to_string()))
        );
    }

    #[test]
    fn test_removed_elements_go_stale() {
        let (desktop, root) = finder();
        let window = desktop.windows(root).unwrap()[0];
        let checkbox = desktop.children(window).unwrap()[0];

        desktop.remove_element(window).unwrap();
        assert_eq!(desktop.role(checkbox), Err(AccessibilityError::InvalidElement));
        assert!(desktop.windows(root).unwrap().is_empty());
        assert_eq!(desktop.children(root).unwrap(), vec![]);
    }

    #[test]
    fn test_terminate_hides_application() {
        let (desktop, root) = finder();
        desktop.terminate(1234);
        assert_eq!(desktop.create_app_root(1234), Err(AccessibilityError::InvalidElement));
        assert_eq!(desktop.role(root), Err(AccessibilityError::InvalidElement));
        assert!(desktop.running_applications().is_empty());
    }

    #[test]
    fn test_notifications_are_delivered_by_pump() {
        let (desktop, root) = finder();
        let window = desktop.windows(root).unwrap()[0];
        let checkbox = desktop.children(window).unwrap()[0];

        let received = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let session = desktop
            .subscribe(
                1234,
                Some(window),
                &[Notification::ValueChanged],
                Arc::new(move |n: RawNotification| sink.lock().unwrap().push(n)),
            )
            .unwrap();

        desktop
            .set_attribute(&Attribute::Value, AttributeValue::Int(1), checkbox)
            .unwrap();
        // Not subscribed to title changes
        desktop
            .set_attribute(&Attribute::Title, AttributeValue::String("x".into()), checkbox)
            .unwrap();

        assert_eq!(desktop.pump(session, Duration::from_millis(10)), PumpStatus::Running);
        let received = received.lock().unwrap().clone();
        assert_eq!(
            received,
            vec![RawNotification {
                name: Notification::ValueChanged,
                element: Some(checkbox)
            }]
        );

        desktop.terminate(1234);
        assert_eq!(desktop.pump(session, Duration::from_millis(10)), PumpStatus::Terminated);
        desktop.unsubscribe(session);
        assert_eq!(desktop.active_subscriptions(), 0);
    }

    #[test]
    fn test_subscribe_failures() {
        let (desktop, _) = finder();
        let noop: NotificationCallback = Arc::new(|_| {});

        assert_eq!(
            desktop.subscribe(77, None, &[Notification::ValueChanged], Arc::clone(&noop)),
            Err(AccessibilityError::InvalidElement)
        );
        assert!(matches!(
            desktop.subscribe(1234, None, &[Notification::from("AXMoved")], Arc::clone(&noop)),
            Err(AccessibilityError::NotificationUnsupported(_))
        ));

        desktop.set_permission_denied(true);
        assert!(matches!(
            desktop.subscribe(1234, None, &[Notification::ValueChanged], noop),
            Err(AccessibilityError::PermissionDenied { .. })
        ));
        assert_eq!(desktop.active_subscriptions(), 0);
    }
}
