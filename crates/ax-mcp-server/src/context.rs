//! Shared state behind every tool call

use crate::config::ServerConfig;
use ax_mcp_core::{
    AccessibilityBridge, AppResolver, ApplicationBlocklist, InMemoryDesktop, ObserverBridge,
    ObserverManager, RateLimiter,
};
use std::sync::Arc;

/// Bridges, safety layer and observation registry for one server instance
///
/// Cheap to clone; clones share the rate limiter window and the session
/// registry.
#[derive(Clone)]
pub struct ServerContext {
    pub config: Arc<ServerConfig>,
    pub elements: Arc<dyn AccessibilityBridge>,
    pub apps: Arc<dyn AppResolver>,
    pub blocklist: Arc<ApplicationBlocklist>,
    pub rate_limiter: Arc<RateLimiter>,
    pub observers: ObserverManager,
}

impl ServerContext {
    /// Wire every collaborator to one backend implementing all bridge traits
    pub fn new<B>(config: ServerConfig, backend: Arc<B>) -> Self
    where
        B: AccessibilityBridge + ObserverBridge + AppResolver + 'static,
    {
        let blocklist = ApplicationBlocklist::new(config.blocklist.iter().cloned());
        let rate_limiter = RateLimiter::new(config.rate_limit);
        let observers = ObserverManager::new(backend.clone(), backend.clone());
        tracing::debug!(
            target: "ax_mcp::server",
            read_only = config.read_only,
            rate_limit = rate_limiter.max_per_second(),
            blocked = blocklist.blocked_ids().count(),
            "server context ready"
        );
        Self {
            config: Arc::new(config),
            elements: backend.clone(),
            apps: backend,
            blocklist: Arc::new(blocklist),
            rate_limiter: Arc::new(rate_limiter),
            observers,
        }
    }

    /// Context over the desktop named by `config.fixture`, or an empty one
    pub fn from_config(config: ServerConfig) -> anyhow::Result<Self> {
        let desktop = match &config.fixture {
            Some(path) => {
                let desktop = InMemoryDesktop::from_json_file(path)?;
                tracing::info!(target: "ax_mcp::server", fixture = %path.display(), "loaded desktop fixture");
                desktop
            }
            None => {
                tracing::warn!(
                    target: "ax_mcp::server",
                    "no desktop fixture given, serving an empty desktop"
                );
                InMemoryDesktop::new()
            }
        };
        Ok(Self::new(config, Arc::new(desktop)))
    }
}
