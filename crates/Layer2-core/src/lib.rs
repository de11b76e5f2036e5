//! toolgate-core: gated tool execution runtime
//!
//! Layer2 - 도구 실행 레이어
//!
//! # 주요 모듈
//!
//! - `tool`: 내장 도구, 경로 경계, 실행 파사드
//! - `process`: shell 명령 실행과 스트리밍 보고서
//! - `patch`: 유일 구간 치환 제안과 승인 후 반영
//! - `mcp`: stdio JSON-RPC provider 연결과 레지스트리
//!
//! # 사용 예시
//!
//! ```ignore
//! use toolgate_core::{ToolExecutionFacade, CancelHandle};
//! use toolgate_foundation::{FixedConfirmation, HostConfig, ToolCallRequest};
//!
//! let config = HostConfig::load(&root)?;
//! let facade = ToolExecutionFacade::new(&root, Arc::new(FixedConfirmation::approve()), &config);
//! facade.providers().startup().await?;
//!
//! let result = facade
//!     .execute(
//!         ToolCallRequest::new("replace_in_file", json!({
//!             "path": "src/main.rs",
//!             "old_span": "fn old()",
//!             "new_span": "fn new()"
//!         })),
//!         None,
//!         CancelHandle::new(),
//!     )
//!     .await;
//! println!("{}", result.to_text());
//! ```

pub mod mcp;
pub mod patch;
pub mod process;
pub mod tool;

// Re-exports: MCP
pub use mcp::{
    ConnectionState, McpClient, McpContent, McpPrompt, McpResource, McpTool, McpToolCall,
    McpToolResult, McpTransport, ProviderConnector, ProviderPrompt, ProviderRegistry,
    ProviderResource, ProviderTool, StartupReport, StdioConnector, StdioTransport,
};

// Re-exports: Patch
pub use patch::{DiffReviewer, GateReviewer, PatchEngine, PatchKind, PatchProposal, ReviewDecision};

// Re-exports: Process
pub use process::{
    CancelHandle, ChunkSink, ExecutionReport, ExecutionStatus, OutputChunk, OutputStream,
    ProcessRunner, Utf8Decoder, NO_OUTPUT,
};

// Re-exports: Tool
pub use tool::{
    all_tools, resolve_safe, validate_arguments, PathGuard, ReadTool, ReplaceTool, RunCommandTool,
    RuntimeContext, Tool, ToolContext, ToolExecutionFacade, ToolRegistry, WriteTool,
};

// Layer1 re-exports
pub use toolgate_foundation::{Error, Result};

/// Layer2 버전
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
