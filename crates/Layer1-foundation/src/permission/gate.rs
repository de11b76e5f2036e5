//! CommandGate - 실행 전 승인 게이트
//!
//! 두 단계로 검사한다.
//!
//! 1. 차단 목록 검사: 매칭되면 프롬프트 없이 즉시 거절 (`SecurityRejected`)
//! 2. 사람 승인: 정확히 `approve` 응답만 허용, 나머지는 모두 거부 (`UserDenied`)
//!
//! 1단계는 빠른 억제일 뿐이고, 실제 경계는 2단계다. 차단 목록을 통과한
//! 요청은 예외 없이 2단계를 거친다.

use super::security::check_forbidden;
use super::types::PermissionAction;
use crate::core::{ConfirmationDelegate, ConfirmationRequest, ConfirmationResponse};
use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 기본 승인 대기 시간 (5분)
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(300);

/// 승인 게이트
///
/// 모든 부작용 있는 작업(셸 명령, 파일 쓰기, provider 도구 호출)이
/// 실행 전에 이 게이트를 통과해야 한다.
#[derive(Clone)]
pub struct CommandGate {
    delegate: Arc<dyn ConfirmationDelegate>,
    confirmation_timeout: Option<Duration>,
}

impl CommandGate {
    pub fn new(delegate: Arc<dyn ConfirmationDelegate>) -> Self {
        Self {
            delegate,
            confirmation_timeout: Some(DEFAULT_CONFIRMATION_TIMEOUT),
        }
    }

    /// 승인 대기 시간 설정 (`None` 이면 무제한 대기)
    pub fn with_confirmation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub fn confirmation_timeout(&self) -> Option<Duration> {
        self.confirmation_timeout
    }

    /// 셸 명령 승인
    ///
    /// 차단 목록에 걸리면 델리게이트를 호출하지 않는다.
    pub async fn authorize_command(&self, command: &str) -> Result<()> {
        if let Some(pattern) = check_forbidden(command) {
            warn!("Blocked command ({}): {}", pattern.reason, command);
            return Err(Error::SecurityRejected(format!(
                "{}: command is blocked",
                pattern.reason
            )));
        }

        self.authorize(ConfirmationRequest::new(PermissionAction::execute(command)))
            .await
    }

    /// 일반 작업 승인 (파일 쓰기, provider 도구 호출)
    pub async fn authorize(&self, request: ConfirmationRequest) -> Result<()> {
        debug!(
            "Awaiting confirmation for {}: {}",
            request.action.kind(),
            request.description
        );

        let response = match self.confirmation_timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.delegate.confirm(&request)).await {
                    Ok(response) => response,
                    Err(_) => {
                        warn!(
                            "Confirmation timed out after {:?}: {}",
                            limit, request.description
                        );
                        return Err(Error::UserDenied(format!(
                            "{} (no response within {}s)",
                            request.description,
                            limit.as_secs()
                        )));
                    }
                }
            }
            None => self.delegate.confirm(&request).await,
        };

        match response {
            ConfirmationResponse::Approve => {
                info!("Approved: {}", request.description);
                Ok(())
            }
            other => {
                warn!("Not approved ({}): {}", other.token(), request.description);
                Err(Error::UserDenied(request.description))
            }
        }
    }
}

impl std::fmt::Debug for CommandGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandGate")
            .field("confirmation_timeout", &self.confirmation_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FixedConfirmation;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 호출 횟수를 세는 델리게이트
    struct CountingDelegate {
        calls: AtomicUsize,
        response: ConfirmationResponse,
    }

    #[async_trait]
    impl ConfirmationDelegate for CountingDelegate {
        async fn confirm(&self, _request: &ConfirmationRequest) -> ConfirmationResponse {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response
        }
    }

    struct NeverAnswers;

    #[async_trait]
    impl ConfirmationDelegate for NeverAnswers {
        async fn confirm(&self, _request: &ConfirmationRequest) -> ConfirmationResponse {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_blocklist_rejects_without_prompt() {
        let delegate = Arc::new(CountingDelegate {
            calls: AtomicUsize::new(0),
            response: ConfirmationResponse::Approve,
        });
        let gate = CommandGate::new(delegate.clone());

        let err = gate.authorize_command("rm -rf /").await.unwrap_err();
        assert!(err.is_security());
        assert_eq!(delegate.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_approve_allows() {
        let gate = CommandGate::new(Arc::new(FixedConfirmation::approve()));
        assert!(gate.authorize_command("echo hello").await.is_ok());
    }

    #[tokio::test]
    async fn test_deny_and_dismiss_are_denials() {
        for response in [ConfirmationResponse::Deny, ConfirmationResponse::Dismiss] {
            let gate = CommandGate::new(Arc::new(FixedConfirmation(response)));
            let err = gate.authorize_command("echo hello").await.unwrap_err();
            assert!(matches!(err, Error::UserDenied(_)));
        }
    }

    #[tokio::test]
    async fn test_confirmation_timeout_is_denial() {
        let gate = CommandGate::new(Arc::new(NeverAnswers))
            .with_confirmation_timeout(Some(Duration::from_millis(20)));

        let err = gate.authorize_command("echo hello").await.unwrap_err();
        assert!(matches!(err, Error::UserDenied(_)));
    }

    #[tokio::test]
    async fn test_provider_tool_goes_through_delegate() {
        let delegate = Arc::new(CountingDelegate {
            calls: AtomicUsize::new(0),
            response: ConfirmationResponse::Approve,
        });
        let gate = CommandGate::new(delegate.clone());

        let request =
            ConfirmationRequest::new(PermissionAction::provider_tool("github", "create_issue"));
        gate.authorize(request).await.unwrap();
        assert_eq!(delegate.calls.load(Ordering::SeqCst), 1);
    }
}
