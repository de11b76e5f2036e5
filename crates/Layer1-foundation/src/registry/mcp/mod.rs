//! MCP provider 실행 목록

mod server;

pub use server::{validate_provider_name, LaunchSpec, McpManifest, MCP_FILE};
