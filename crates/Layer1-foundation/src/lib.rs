//! # toolgate-foundation
//!
//! Foundation layer for toolgate:
//! - Core: 공용 타입과 인터페이스 (ToolCallRequest, ToolResult, ConfirmationDelegate)
//! - Permission: 차단 목록, 실행 허용 목록, 승인 게이트 (CommandGate)
//! - Registry: provider 실행 목록 (McpManifest)
//! - Storage: JsonStore (전역 / 프로젝트)
//! - Config: HostConfig
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Tool Execution Facade                                  │
//! │  ├── Builtin Tools (run_command, replace_in_file...)    │
//! │  └── Provider Tools (<provider>__<tool>)                │
//! │                     │                                   │
//! │                     ▼                                   │
//! │      CommandGate (blocklist → human confirmation)       │
//! │                     │                                   │
//! │          ┌──────────┴──────────┐                        │
//! │          ▼                     ▼                        │
//! │   ProcessRunner          Provider stdio                 │
//! │   (sh -c, cmd /C)        (JSON-RPC 2.0)                 │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod permission;
pub mod registry;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Core (핵심 Trait 및 타입)
// ============================================================================
pub use core::{
    // Types (types.rs)
    ActionState,
    ToolCallRequest,
    ToolSource,
    FAILURE_MARKER,
    NAMESPACE_SEPARATOR,
    SUCCESS_MARKER,
    // Traits (traits.rs)
    ConfirmationDelegate,
    ConfirmationRequest,
    ConfirmationResponse,
    FixedConfirmation,
    ToolExecutionResult,
    ToolMeta,
    ToolResult,
};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{HostConfig, CONFIG_FILE, DEFAULT_AGENT_MARKER_ENV};

// ============================================================================
// Permission (승인 게이트)
// ============================================================================
pub use permission::{
    check_forbidden, is_allowed_launch_command, is_safe_argument, validate_launch, CommandGate,
    ForbiddenPattern, PermissionAction, ALLOWED_LAUNCH_COMMANDS, DEFAULT_CONFIRMATION_TIMEOUT,
};

// ============================================================================
// Registry (provider 실행 목록)
// ============================================================================
pub use registry::{validate_provider_name, LaunchSpec, McpManifest, MCP_FILE};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::{JsonStore, PROJECT_DIR};
