//! Error types for toolgate
//!
//! 모든 에러를 중앙에서 관리

use crate::core::ActionState;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// toolgate 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 보안 / 승인
    // ========================================================================
    /// 차단 목록, 작업 영역 밖 경로, 허용되지 않은 provider 명령/인자
    #[error("Security rejected: {0}")]
    SecurityRejected(String),

    /// 사용자가 명시적으로 거부 (또는 응답 시간 초과)
    #[error("Denied by user: {0}")]
    UserDenied(String),

    // ========================================================================
    // 조회 / 편집
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ambiguous match: {0}")]
    Ambiguous(String),

    /// 제안 이후 파일이 변경됨
    #[error("Conflict: {0}")]
    Conflict(String),

    // ========================================================================
    // Provider / 프로세스
    // ========================================================================
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Failed to spawn process: {0}")]
    Spawn(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Cancelled")]
    Cancelled,

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 보안 경계에서 발생한 거절인지
    pub fn is_security(&self) -> bool {
        matches!(self, Error::SecurityRejected(_))
    }

    /// 재시도 가능한 에러인지 확인
    ///
    /// 보안 거절과 사용자 거부는 절대 재시도하지 않는다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Timeout(_) | Error::Protocol(_))
    }

    /// 사용자에게 보여줄 수 있는 에러인지 확인
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::SecurityRejected(_)
                | Error::UserDenied(_)
                | Error::NotFound(_)
                | Error::Ambiguous(_)
                | Error::Conflict(_)
                | Error::InvalidInput(_)
                | Error::Cancelled
        )
    }

    /// 이 에러로 끝난 작업의 최종 상태
    pub fn action_state(&self) -> ActionState {
        match self {
            Error::SecurityRejected(_) => ActionState::Rejected,
            Error::UserDenied(_) => ActionState::Denied,
            Error::Cancelled => ActionState::Cancelled,
            _ => ActionState::Errored,
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_state_mapping() {
        assert_eq!(
            Error::SecurityRejected("rm -rf /".into()).action_state(),
            ActionState::Rejected
        );
        assert_eq!(Error::UserDenied("no".into()).action_state(), ActionState::Denied);
        assert_eq!(Error::Cancelled.action_state(), ActionState::Cancelled);
        assert_eq!(Error::Spawn("boom".into()).action_state(), ActionState::Errored);
    }

    #[test]
    fn test_security_is_never_retryable() {
        assert!(!Error::SecurityRejected("x".into()).is_retryable());
        assert!(!Error::UserDenied("x".into()).is_retryable());
        assert!(Error::Timeout("x".into()).is_retryable());
    }
}
