//! Bundle-identifier blocklist for write operations

use crate::bridge::{AccessibilityBridge, AppResolver, Attribute};
use crate::constants::{BUNDLE_IDENTIFIER_ATTRIBUTE, DEFAULT_BLOCKED_BUNDLE_IDS};
use crate::errors::BlocklistError;
use std::collections::BTreeSet;

/// Applications write tools must never touch
///
/// The default set is always present; configured identifiers are added to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationBlocklist {
    blocked: BTreeSet<String>,
}

impl Default for ApplicationBlocklist {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

impl ApplicationBlocklist {
    pub fn new<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let blocked = DEFAULT_BLOCKED_BUNDLE_IDS
            .iter()
            .map(|id| id.to_string())
            .chain(extra.into_iter().map(Into::into))
            .collect();
        Self { blocked }
    }

    pub fn is_blocked_bundle(&self, bundle_id: &str) -> bool {
        self.blocked.contains(bundle_id)
    }

    pub fn blocked_ids(&self) -> impl Iterator<Item = &str> {
        self.blocked.iter().map(String::as_str)
    }

    /// Bundle identifier of `app` when it is on the list
    ///
    /// Unresolvable apps and apps without a readable identifier count as not
    /// blocked.
    pub fn blocked_bundle_id(
        &self,
        app: &str,
        resolver: &dyn AppResolver,
        bridge: &dyn AccessibilityBridge,
    ) -> Option<String> {
        let pid = resolver.resolve(app).ok()?;
        let root = bridge.create_app_root(pid).ok()?;
        let bundle_id = bridge
            .string_attribute(&Attribute::from(BUNDLE_IDENTIFIER_ATTRIBUTE), root)
            .ok()?;
        self.is_blocked_bundle(&bundle_id).then_some(bundle_id)
    }

    pub fn is_blocked(
        &self,
        app: &str,
        resolver: &dyn AppResolver,
        bridge: &dyn AccessibilityBridge,
    ) -> bool {
        self.blocked_bundle_id(app, resolver, bridge).is_some()
    }

    /// Reject `app` if it is blocklisted
    pub fn check(
        &self,
        app: &str,
        resolver: &dyn AppResolver,
        bridge: &dyn AccessibilityBridge,
    ) -> Result<(), BlocklistError> {
        match self.blocked_bundle_id(app, resolver, bridge) {
            Some(bundle_id) => {
                tracing::warn!(target: "ax_mcp::security", app, %bundle_id, "blocked write to protected application");
                Err(BlocklistError::BlockedApplication {
                    app: app.to_string(),
                    bundle_id,
                })
            }
            None => Ok(()),
        }
    }
}
