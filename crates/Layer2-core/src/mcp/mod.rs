//! MCP - 외부 provider 프로세스 연동
//!
//! provider 는 stdio 위 JSON-RPC 2.0 으로 도구, 프롬프트, 리소스를 제공한다.
//!
//! - `transport`: 줄 단위 JSON-RPC 송수신, 요청 타임아웃
//! - `client`: provider 하나와의 연결 (핸드셰이크, 타입 있는 요청)
//! - `registry`: manifest 기반 연결 묶음 (startup / shutdown / reload, 집계, 라우팅)
//!
//! ## 참고
//! - https://modelcontextprotocol.io/

mod client;
mod registry;
mod transport;
mod types;

pub use client::{McpClient, ServerInfo, MCP_PROTOCOL_VERSION};
pub use registry::{
    ConnectionState, ProviderConnector, ProviderRegistry, StartupReport, StdioConnector,
};
pub use transport::{
    JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, McpTransport,
    StdioTransport, DEFAULT_REQUEST_TIMEOUT,
};
pub use types::{
    GetPromptResult, McpContent, McpPrompt, McpPromptArgument, McpResource, McpTool, McpToolCall,
    McpToolResult, PromptMessage, ProviderPrompt, ProviderResource, ProviderTool,
    ReadResourceResult, ResourceContents,
};
