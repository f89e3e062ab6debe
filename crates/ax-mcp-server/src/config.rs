//! Server configuration from command-line flags and environment variables

use crate::constants::{ENV_READ_ONLY, READ_ONLY_TRUTHY};
use ax_mcp_core::constants::DEFAULT_RATE_LIMIT_PER_SECOND;
use clap::Args;
use std::path::PathBuf;

/// Flags accepted by `serve`
#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// Reject every write tool (also AX_MCP_READ_ONLY=1|true)
    #[arg(long)]
    pub read_only: bool,

    /// Maximum write actions per second
    #[arg(long, env = "AX_MCP_RATE_LIMIT")]
    pub rate_limit: Option<String>,

    /// Extra bundle identifiers to block, comma separated
    #[arg(long, env = "AX_MCP_BLOCKLIST")]
    pub blocklist: Option<String>,

    /// Desktop fixture (JSON) served by the in-memory bridge
    #[arg(long, env = "AX_MCP_FIXTURE")]
    pub fixture: Option<PathBuf>,
}

/// Resolved settings the tool layer runs with
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub read_only: bool,
    pub rate_limit: usize,
    pub blocklist: Vec<String>,
    pub fixture: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            read_only: false,
            rate_limit: DEFAULT_RATE_LIMIT_PER_SECOND,
            blocklist: Vec::new(),
            fixture: None,
        }
    }
}

impl ServerConfig {
    /// Build from parsed flags and the process environment
    pub fn from_args(args: &ServeArgs) -> Self {
        let read_only_env = std::env::var(ENV_READ_ONLY).ok();
        Self::resolve(args, read_only_env.as_deref())
    }

    fn resolve(args: &ServeArgs, read_only_env: Option<&str>) -> Self {
        let read_only = args.read_only || read_only_env.is_some_and(is_truthy);
        let rate_limit = args
            .rate_limit
            .as_deref()
            .map_or(DEFAULT_RATE_LIMIT_PER_SECOND, parse_rate_limit);
        let blocklist = args
            .blocklist
            .as_deref()
            .map(parse_blocklist)
            .unwrap_or_default();

        Self {
            read_only,
            rate_limit,
            blocklist,
            fixture: args.fixture.clone(),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    READ_ONLY_TRUTHY
        .iter()
        .any(|truthy| value.trim().eq_ignore_ascii_case(truthy))
}

fn parse_rate_limit(raw: &str) -> usize {
    match raw.trim().parse::<i64>() {
        Ok(limit) if limit > 0 => usize::try_from(limit).unwrap_or(DEFAULT_RATE_LIMIT_PER_SECOND),
        _ => {
            tracing::warn!(
                target: "ax_mcp::server",
                value = raw,
                default = DEFAULT_RATE_LIMIT_PER_SECOND,
                "invalid rate limit, using default"
            );
            DEFAULT_RATE_LIMIT_PER_SECOND
        }
    }
}

fn parse_blocklist(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}
