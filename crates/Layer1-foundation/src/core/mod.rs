//! Core Module - 핵심 인터페이스 및 타입
//!
//! ## 타입 계층
//!
//! - `types.rs`: 데이터 타입 (ToolCallRequest, ToolSource, ActionState)
//! - `traits.rs`: 인터페이스 (ToolMeta, ToolResult, ConfirmationDelegate)
//!
//! ## 흐름
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  ToolCallRequest                            │
//! │           ┌─────────────┴─────────────┐                     │
//! │           ▼                           ▼                     │
//! │  ┌─────────────────┐        ┌─────────────────┐             │
//! │  │  Builtin Tools  │        │ Provider Tools  │             │
//! │  │  run_command    │        │ <provider>__<t> │             │
//! │  │  replace...     │        │                 │             │
//! │  └────────┬────────┘        └────────┬────────┘             │
//! │           └────────────┬─────────────┘                      │
//! │                        ▼                                    │
//! │               ┌────────────────┐                            │
//! │               │  CommandGate   │ ← 차단 목록 + 사람 승인     │
//! │               └────────────────┘                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod traits;
pub mod types;

pub use types::{
    ActionState, ToolCallRequest, ToolSource, FAILURE_MARKER, NAMESPACE_SEPARATOR,
    SUCCESS_MARKER,
};

pub use traits::{
    ConfirmationDelegate, ConfirmationRequest, ConfirmationResponse, FixedConfirmation,
    ToolExecutionResult, ToolMeta, ToolResult,
};
