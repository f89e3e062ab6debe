//! MCP server for desktop UI automation
//!
//! This server exposes accessibility trees of running applications as MCP tools.

mod config;
mod constants;
mod context;
mod errors;
mod guide;
mod requests;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::{ServeArgs, ServerConfig};
use context::ServerContext;
use requests::{
    FindElementRequest, GetFocusedElementRequest, GetUiTreeRequest, ListWindowsRequest,
    ObserveChangesRequest, PerformActionRequest, SetValueRequest,
};
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::tool::ToolRouter,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    transport::stdio,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ax-mcp-server", version, about = "MCP server for desktop UI automation")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Run the MCP server over stdio (default)
    Serve(ServeArgs),
    /// Print setup instructions
    Guide,
}

/// ax-mcp server handler
#[derive(Clone)]
struct AxMcpServer {
    tool_router: ToolRouter<Self>,
    context: ServerContext,
}

impl AxMcpServer {
    fn new(context: ServerContext) -> Self {
        Self {
            tool_router: Self::tool_router(),
            context,
        }
    }
}

#[tool_router]
impl AxMcpServer {
    #[tool(description = "Ping the ax-mcp server to verify it's running")]
    async fn ping(&self) -> String {
        tools::basic::ping()
    }

    #[tool(
        description = "Get the accessibility tree of an application. `app` is a name, bundle id or PID. Every node carries an element path usable by the write tools."
    )]
    async fn get_ui_tree(&self, Parameters(request): Parameters<GetUiTreeRequest>) -> String {
        tools::tree::get_ui_tree(&self.context, request).await
    }

    #[tool(
        description = "Search an application for elements by role, title, value or identifier. Title matches a case-insensitive substring, value must match exactly."
    )]
    async fn find_element(&self, Parameters(request): Parameters<FindElementRequest>) -> String {
        tools::find::find_element(&self.context, request).await
    }

    #[tool(
        description = "Get the element that has keyboard focus, in one application or system-wide when `app` is omitted"
    )]
    async fn get_focused_element(
        &self,
        Parameters(request): Parameters<GetFocusedElementRequest>,
    ) -> String {
        tools::focus::get_focused_element(&self.context, request).await
    }

    #[tool(
        description = "List windows with title, position, size, minimized and frontmost state. Lists every running application when `app` is omitted."
    )]
    async fn list_windows(&self, Parameters(request): Parameters<ListWindowsRequest>) -> String {
        tools::windows::list_windows(&self.context, request).await
    }

    #[tool(
        description = "Perform an accessibility action (AXPress, AXPick, AXShowMenu, AXConfirm, AXCancel, AXRaise, AXIncrement, AXDecrement) on the element at `element_path`"
    )]
    async fn perform_action(
        &self,
        Parameters(request): Parameters<PerformActionRequest>,
    ) -> String {
        tools::action::perform_action(&self.context, request).await
    }

    #[tool(description = "Set the value of the element at `element_path` (string, boolean or number)")]
    async fn set_value(&self, Parameters(request): Parameters<SetValueRequest>) -> String {
        tools::value::set_value(&self.context, request).await
    }

    #[tool(
        description = "Record UI changes (value_changed, focus_changed, window_created, window_destroyed, title_changed) in an application for 1 to 300 seconds"
    )]
    async fn observe_changes(
        &self,
        Parameters(request): Parameters<ObserveChangesRequest>,
    ) -> String {
        tools::observe::observe_changes(&self.context, request).await
    }
}

#[tool_handler]
impl ServerHandler for AxMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(constants::SERVER_INSTRUCTIONS.into()),
        }
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = ServerConfig::from_args(&args);
    tracing::info!(
        target: "ax_mcp::server",
        read_only = config.read_only,
        rate_limit = config.rate_limit,
        "Starting ax-mcp server..."
    );

    let context = ServerContext::from_config(config)?;
    let observers = context.observers.clone();
    let service = AxMcpServer::new(context).serve(stdio()).await?;

    tracing::info!(target: "ax_mcp::server", "Server started, waiting for connections...");
    let outcome = service.waiting().await;
    observers.stop_all();
    outcome?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries MCP traffic
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    match cli.command {
        Some(Command::Guide) => {
            guide::print_guide();
            Ok(())
        }
        Some(Command::Serve(args)) => serve(args).await,
        None => serve(cli.serve).await,
    }
}
