//! Permission system for toolgate
//!
//! - `types`: 승인 대상 작업 (PermissionAction)
//! - `security`: 차단 명령어, provider 실행 허용 목록
//! - `gate`: 차단 목록 + 사람 승인 (CommandGate)
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use toolgate_foundation::permission::CommandGate;
//!
//! let gate = CommandGate::new(Arc::new(StdinConfirmation::new()));
//!
//! // 차단 목록에 걸리면 프롬프트 없이 SecurityRejected
//! gate.authorize_command("rm -rf /").await?;
//! ```

mod gate;
pub mod security;
mod types;

pub use gate::{CommandGate, DEFAULT_CONFIRMATION_TIMEOUT};
pub use security::{
    check_forbidden, is_allowed_launch_command, is_safe_argument, validate_launch,
    ForbiddenPattern, PatternType, ALLOWED_LAUNCH_COMMANDS,
};
pub use types::PermissionAction;
