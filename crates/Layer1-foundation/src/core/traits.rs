//! Core Traits - 레이어 간 인터페이스
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Layer4-CLI                                                 │
//! │  └── ConfirmationDelegate 구현 (승인 프롬프트)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Layer2-Core                                                │
//! │  ├── Tool 구현 (run_command, replace_in_file ...)           │
//! │  ├── ProcessRunner / PatchEngine                            │
//! │  └── Provider 레지스트리 (stdio JSON-RPC)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Layer1-Foundation (이 레이어)                              │
//! │  ├── 결과 타입 (ToolMeta, ToolResult)                       │
//! │  ├── 승인 게이트 (CommandGate)                              │
//! │  └── Launch manifest / 설정 저장소                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use super::types::{ActionState, FAILURE_MARKER, SUCCESS_MARKER};
use crate::error::Error;
use crate::permission::PermissionAction;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// Tool Meta / Result
// ============================================================================

/// 도구 메타데이터
#[derive(Debug, Clone)]
pub struct ToolMeta {
    /// 도구 이름 (고유 식별자)
    pub name: String,
    /// 표시 이름
    pub display_name: String,
    /// 설명
    pub description: String,
    /// 카테고리 (filesystem, execute, provider 등)
    pub category: String,
    /// 실행 전에 사람의 승인이 필요한지
    pub requires_confirmation: bool,
}

impl ToolMeta {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            description: String::new(),
            category: "general".to_string(),
            requires_confirmation: false,
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn category(mut self, cat: impl Into<String>) -> Self {
        self.category = cat.into();
        self
    }

    pub fn requires_confirmation(mut self, required: bool) -> Self {
        self.requires_confirmation = required;
        self
    }
}

/// 도구 실행 결과
///
/// 호출자는 항상 텍스트 결과를 받는다. 실패도 값으로 돌아온다.
#[derive(Debug, Clone)]
pub struct ToolExecutionResult {
    /// 성공 여부
    pub success: bool,
    /// 출력 내용
    pub output: String,
    /// 에러 메시지 (실패 시)
    pub error: Option<String>,
    /// 작업의 최종 상태
    pub state: ActionState,
    /// 추가 메타데이터
    pub metadata: HashMap<String, Value>,
}

impl ToolExecutionResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            state: ActionState::Closed,
            metadata: HashMap::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(message.into()),
            state: ActionState::Errored,
            metadata: HashMap::new(),
        }
    }

    /// 에러 종류에 맞는 최종 상태로 실패 결과 생성
    pub fn from_error(err: &Error) -> Self {
        Self::error(err.to_string()).with_state(err.action_state())
    }

    pub fn with_state(mut self, state: ActionState) -> Self {
        self.state = state;
        self
    }

    /// 실패여도 본문(예: 실행 보고서)을 함께 전달할 때
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// 표시/모델 전달용 텍스트
    ///
    /// 실패는 항상 `[ERROR]` 표식을 달고, 빈 성공은 `[OK]` 표식이 된다.
    pub fn to_text(&self) -> String {
        if self.success {
            if self.output.is_empty() {
                SUCCESS_MARKER.to_string()
            } else {
                self.output.clone()
            }
        } else {
            let message = self.error.as_deref().unwrap_or("Unknown error");
            if self.output.is_empty() {
                format!("{} {}", FAILURE_MARKER, message)
            } else {
                format!("{} {}\n{}", FAILURE_MARKER, message, self.output)
            }
        }
    }
}

pub type ToolResult = ToolExecutionResult;

// ============================================================================
// Confirmation Delegate - 사람 승인 인터페이스
// ============================================================================

/// 승인 응답 토큰
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfirmationResponse {
    /// 실행 허용
    Approve,
    /// 거부
    Deny,
    /// 응답 없이 닫힘
    Dismiss,
}

impl ConfirmationResponse {
    pub const APPROVE_TOKEN: &'static str = "approve";
    pub const DENY_TOKEN: &'static str = "deny";
    pub const DISMISS_TOKEN: &'static str = "dismiss";

    /// 원시 응답 해석
    ///
    /// 정확히 `approve` 인 경우만 승인이다. 대소문자나 공백이 달라도 거부.
    pub fn from_token(token: &str) -> Self {
        match token {
            Self::APPROVE_TOKEN => Self::Approve,
            Self::DISMISS_TOKEN => Self::Dismiss,
            _ => Self::Deny,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Self::Approve => Self::APPROVE_TOKEN,
            Self::Deny => Self::DENY_TOKEN,
            Self::Dismiss => Self::DISMISS_TOKEN,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approve)
    }
}

/// 승인 요청 내용
#[derive(Debug, Clone)]
pub struct ConfirmationRequest {
    /// 요청 대상 작업
    pub action: PermissionAction,
    /// 한 줄 설명
    pub description: String,
    /// 추가 정보 (diff, 인자 등)
    pub detail: Option<String>,
}

impl ConfirmationRequest {
    pub fn new(action: PermissionAction) -> Self {
        Self {
            description: action.description(),
            action,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// 승인 UI 델리게이트
///
/// Layer4-CLI(또는 다른 UI)에서 구현합니다.
/// 호출은 사람이 응답할 때까지 대기합니다.
#[async_trait]
pub trait ConfirmationDelegate: Send + Sync {
    /// 승인 프롬프트 표시
    async fn confirm(&self, request: &ConfirmationRequest) -> ConfirmationResponse;
}

/// 항상 같은 응답을 돌려주는 델리게이트 (스크립트 실행, `--yes`)
#[derive(Debug, Clone, Copy)]
pub struct FixedConfirmation(pub ConfirmationResponse);

impl FixedConfirmation {
    pub fn approve() -> Self {
        Self(ConfirmationResponse::Approve)
    }

    pub fn deny() -> Self {
        Self(ConfirmationResponse::Deny)
    }
}

#[async_trait]
impl ConfirmationDelegate for FixedConfirmation {
    async fn confirm(&self, _request: &ConfirmationRequest) -> ConfirmationResponse {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_meta_builder() {
        let meta = ToolMeta::new("run_command")
            .display_name("Run Command")
            .description("Execute shell commands")
            .category("execute")
            .requires_confirmation(true);

        assert_eq!(meta.name, "run_command");
        assert_eq!(meta.display_name, "Run Command");
        assert_eq!(meta.category, "execute");
        assert!(meta.requires_confirmation);
    }

    #[test]
    fn test_only_exact_approve_token_approves() {
        assert!(ConfirmationResponse::from_token("approve").is_approved());
        assert!(!ConfirmationResponse::from_token("Approve").is_approved());
        assert!(!ConfirmationResponse::from_token(" approve").is_approved());
        assert!(!ConfirmationResponse::from_token("yes").is_approved());
        assert_eq!(
            ConfirmationResponse::from_token("dismiss"),
            ConfirmationResponse::Dismiss
        );
    }

    #[test]
    fn test_result_text_markers() {
        assert_eq!(ToolResult::success("").to_text(), SUCCESS_MARKER);
        assert_eq!(ToolResult::success("data").to_text(), "data");

        let failed = ToolResult::error("span not found");
        assert!(failed.to_text().starts_with(FAILURE_MARKER));
        assert_eq!(failed.state, ActionState::Errored);
    }

    #[test]
    fn test_result_from_error_keeps_state() {
        let result = ToolResult::from_error(&Error::UserDenied("run_command".into()));
        assert!(!result.success);
        assert_eq!(result.state, ActionState::Denied);
    }
}
