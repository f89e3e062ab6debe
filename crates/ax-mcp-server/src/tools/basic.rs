//! Basic tool implementations (ping)

/// Ping the server to check if it's running
pub fn ping() -> String {
    "pong".to_string()
}
