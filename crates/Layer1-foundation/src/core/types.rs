//! Core Types - 공용 타입 정의
//!
//! 모든 레이어에서 공통으로 사용하는 타입들

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// provider 이름과 도구 이름을 잇는 구분자
pub const NAMESPACE_SEPARATOR: &str = "__";

/// 실패 결과 문자열에 붙는 고정 표식
pub const FAILURE_MARKER: &str = "[ERROR]";

/// 출력이 없는 성공 결과에 쓰는 표식
pub const SUCCESS_MARKER: &str = "[OK]";

// ============================================================================
// Tool Source - 도구 출처
// ============================================================================

/// 도구 출처 (어디서 왔는지)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolSource {
    /// 내장 도구 (run_command, replace_in_file 등)
    Builtin { name: String },

    /// 외부 provider 프로세스가 제공하는 도구
    Provider { provider: String, tool: String },
}

impl ToolSource {
    pub fn builtin(name: impl Into<String>) -> Self {
        Self::Builtin { name: name.into() }
    }

    pub fn provider(provider: impl Into<String>, tool: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            tool: tool.into(),
        }
    }

    /// 노출 이름 해석
    ///
    /// 첫 번째 `__` 에서 나눈다. 구분자가 없으면 내장 도구로 본다.
    pub fn parse(name: &str) -> Self {
        match name.split_once(NAMESPACE_SEPARATOR) {
            Some((provider, tool)) => Self::provider(provider, tool),
            None => Self::builtin(name),
        }
    }

    /// AI에게 노출되는 이름 (`<provider>__<tool>`)
    pub fn exposed_name(&self) -> String {
        match self {
            Self::Builtin { name } => name.clone(),
            Self::Provider { provider, tool } => {
                format!("{}{}{}", provider, NAMESPACE_SEPARATOR, tool)
            }
        }
    }

    /// 표시용 이름
    pub fn display_name(&self) -> String {
        match self {
            Self::Builtin { name } => name.clone(),
            Self::Provider { provider, tool } => format!("{}/{}", provider, tool),
        }
    }
}

impl std::fmt::Display for ToolSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.exposed_name())
    }
}

// ============================================================================
// Tool Call Request
// ============================================================================

/// 오케스트레이터가 넘겨주는 도구 호출 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// 도구 이름 (`<provider>__<tool>` 형식일 수 있음)
    pub name: String,

    /// 인자 (JSON)
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    pub fn source(&self) -> ToolSource {
        ToolSource::parse(&self.name)
    }
}

// ============================================================================
// Action State - 요청 하나의 상태 머신
// ============================================================================

/// 대기 중인 작업의 상태
///
/// ```text
/// Idle ─┬─▶ Rejected
///       └─▶ PendingConfirmation ─┬─▶ Denied
///                                └─▶ Running ─┬─▶ Closed
///                                             ├─▶ Errored
///                                             └─▶ Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionState {
    Idle,
    /// 차단 목록/허용 목록 검사에서 거절됨
    Rejected,
    PendingConfirmation,
    /// 사용자가 승인하지 않음
    Denied,
    Running,
    /// 정상 종료 (종료 코드와 무관)
    Closed,
    Errored,
    Cancelled,
}

impl ActionState {
    /// 더 이상 전이가 없는 상태인지
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Rejected | Self::Denied | Self::Closed | Self::Errored | Self::Cancelled
        )
    }

    /// 허용된 전이인지
    pub fn can_transition_to(&self, next: ActionState) -> bool {
        use ActionState::*;
        matches!(
            (self, next),
            (Idle, Rejected)
                | (Idle, PendingConfirmation)
                | (Idle, Running)
                | (PendingConfirmation, Denied)
                | (PendingConfirmation, Running)
                | (Running, Closed)
                | (Running, Errored)
                | (Running, Cancelled)
        )
    }
}

impl std::fmt::Display for ActionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Rejected => "rejected",
            Self::PendingConfirmation => "pending_confirmation",
            Self::Denied => "denied",
            Self::Running => "running",
            Self::Closed => "closed",
            Self::Errored => "errored",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_source_parse_splits_on_first_separator() {
        assert_eq!(
            ToolSource::parse("serverA__toolX"),
            ToolSource::provider("serverA", "toolX")
        );
        assert_eq!(
            ToolSource::parse("a__b__c"),
            ToolSource::provider("a", "b__c")
        );
        assert_eq!(ToolSource::parse("badname"), ToolSource::builtin("badname"));
    }

    #[test]
    fn test_exposed_name() {
        let source = ToolSource::provider("github", "create_issue");
        assert_eq!(source.exposed_name(), "github__create_issue");
        assert_eq!(source.display_name(), "github/create_issue");
    }

    #[test]
    fn test_action_state_transitions() {
        assert!(ActionState::Idle.can_transition_to(ActionState::Rejected));
        assert!(ActionState::PendingConfirmation.can_transition_to(ActionState::Denied));
        assert!(ActionState::Running.can_transition_to(ActionState::Cancelled));
        assert!(!ActionState::Denied.can_transition_to(ActionState::Running));
        assert!(!ActionState::Rejected.can_transition_to(ActionState::PendingConfirmation));
        assert!(ActionState::Closed.is_terminal());
        assert!(!ActionState::Running.is_terminal());
    }
}
