//! Tool System - 내장 도구와 실행 진입점
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ToolExecutionFacade                                         │
//! │  ├── <provider>__<tool> → ProviderRegistry                  │
//! │  └── 그 외 → ToolRegistry                                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ToolRegistry                                                │
//! │  ├── definitions() - AI용 스키마                             │
//! │  └── execute() - 인자 검증 후 실행                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  RuntimeContext (ToolContext 구현)                           │
//! │  └── PathGuard / CommandGate / ProcessRunner / PatchEngine   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Builtin Tools                                               │
//! │  ├── run_command                                             │
//! │  ├── read_file                                               │
//! │  ├── write_to_file                                           │
//! │  └── replace_in_file                                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod builtin;
mod context;
mod facade;
mod registry;
pub mod schema;
pub mod security;
mod traits;

pub use builtin::{all_tools, ReadTool, ReplaceTool, RunCommandTool, WriteTool};
pub use context::RuntimeContext;
pub use facade::ToolExecutionFacade;
pub use registry::ToolRegistry;
pub use schema::validate_arguments;
pub use security::{resolve_safe, PathGuard};
pub use traits::{Tool, ToolContext};
