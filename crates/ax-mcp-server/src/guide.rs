//! Setup guide for ax-mcp
//!
//! This module contains the guide text displayed by `ax-mcp-server guide`.

/// Print the setup guide to stdout
pub fn print_guide() {
    let version = env!("CARGO_PKG_VERSION");
    print!(
        r#"
================================================================================
                         ax-mcp-server Setup Guide
                              Version {version}
================================================================================

ax-mcp lets MCP clients read and drive desktop applications through their
accessibility tree.

--------------------------------------------------------------------------------
STEP 1: Describe a desktop
--------------------------------------------------------------------------------

The server reads applications from a JSON desktop fixture:

    {{
      "applications": [
        {{
          "pid": 501,
          "name": "TextEdit",
          "bundle_id": "com.apple.TextEdit",
          "root": {{
            "role": "AXApplication",
            "children": [
              {{
                "role": "AXWindow",
                "title": "Untitled",
                "children": [
                  {{ "role": "AXTextField", "value": "", "actions": ["AXConfirm"] }},
                  {{ "role": "AXButton", "title": "Save", "actions": ["AXPress"] }}
                ]
              }}
            ]
          }}
        }}
      ],
      "focused": "app(501)/window[0]/AXTextField[0]"
    }}

--------------------------------------------------------------------------------
STEP 2: Configure your MCP client
--------------------------------------------------------------------------------

Create or edit `.mcp.json` in your project root:

    {{
      "mcpServers": {{
        "ax-mcp": {{
          "command": "ax-mcp-server",
          "args": ["--fixture", "desktop.json"],
          "env": {{
            "AX_MCP_RATE_LIMIT": "10"
          }}
        }}
      }}
    }}

For cargo-based development, use:

    {{
      "mcpServers": {{
        "ax-mcp": {{
          "command": "cargo",
          "args": ["run", "-p", "ax-mcp-server", "--", "--fixture", "desktop.json"]
        }}
      }}
    }}

--------------------------------------------------------------------------------
STEP 3: Address elements
--------------------------------------------------------------------------------

Element paths are returned by get_ui_tree and find_element:

    app(501)/AXWindow[0]/AXButton[1]        by role and index
    app("TextEdit")/window["Untitled"]      by app name and window title
    app(501)/window[0]/AXButton["Save"]     by role and title

Write tools only accept paths that point into the app they were given.

--------------------------------------------------------------------------------
ENVIRONMENT VARIABLES
--------------------------------------------------------------------------------

  AX_MCP_READ_ONLY     "1" or "true" rejects every write tool (or --read-only)
  AX_MCP_RATE_LIMIT    Write actions per second, default 10 (or --rate-limit)
  AX_MCP_BLOCKLIST     Extra bundle ids to block, comma separated (or --blocklist)
  AX_MCP_FIXTURE       Desktop fixture JSON (or --fixture)
  RUST_LOG             Log level (e.g., "info", "debug")

Terminal, iTerm2, Keychain Access and System Settings are always blocked for
writes.

--------------------------------------------------------------------------------
AVAILABLE MCP TOOLS
--------------------------------------------------------------------------------

Inspection:
  - get_ui_tree          Accessibility tree of an application
  - find_element         Search by role, title, value or identifier
  - get_focused_element  Element with keyboard focus
  - list_windows         Windows with geometry and state

Interaction:
  - perform_action       AXPress, AXConfirm, AXIncrement and other actions
  - set_value            Write an element's value

Observation:
  - observe_changes      Record UI events for 1 to 300 seconds

For more information, visit: https://github.com/dijdzv/ax-mcp

================================================================================
"#
    );
}
