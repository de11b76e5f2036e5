//! Registry - provider 등록 정보
//!
//! - `mcp/` - provider 실행 목록 (`.toolgate/mcp.json`)

pub mod mcp;

pub use mcp::{validate_provider_name, LaunchSpec, McpManifest, MCP_FILE};
