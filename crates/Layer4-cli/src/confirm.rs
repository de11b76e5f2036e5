//! 터미널 승인 프롬프트
//!
//! 요청 내용과 상세(diff, 인자)를 stderr 에 보여주고 stdin 한 줄을 읽는다.
//! 줄 끝 개행만 떼고 그대로 토큰으로 해석하므로 정확히 `approve` 만 승인이다.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::sync::Mutex;
use toolgate_foundation::{ConfirmationDelegate, ConfirmationRequest, ConfirmationResponse};
use tracing::debug;

/// stdin 기반 승인 델리게이트
///
/// 프롬프트는 한 번에 하나씩만 뜬다.
pub struct TerminalConfirmation {
    input: Mutex<BufReader<Stdin>>,
}

impl TerminalConfirmation {
    pub fn new() -> Self {
        Self {
            input: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }
}

/// 입력 한 줄 해석 (`None` 은 EOF)
pub fn parse_reply(line: Option<&str>) -> ConfirmationResponse {
    match line {
        Some(line) => ConfirmationResponse::from_token(line.trim_end_matches(['\r', '\n'])),
        None => ConfirmationResponse::Dismiss,
    }
}

fn render_prompt(request: &ConfirmationRequest) -> String {
    let mut prompt = format!("\n⚠ {}\n", request.description);
    if let Some(detail) = &request.detail {
        prompt.push_str(detail.trim_end());
        prompt.push('\n');
    }
    prompt.push_str(&format!(
        "Type '{}' to allow, anything else denies: ",
        ConfirmationResponse::APPROVE_TOKEN
    ));
    prompt
}

#[async_trait]
impl ConfirmationDelegate for TerminalConfirmation {
    async fn confirm(&self, request: &ConfirmationRequest) -> ConfirmationResponse {
        let mut input = self.input.lock().await;

        let mut stderr = tokio::io::stderr();
        if stderr.write_all(render_prompt(request).as_bytes()).await.is_err() {
            return ConfirmationResponse::Dismiss;
        }
        let _ = stderr.flush().await;

        let mut line = String::new();
        let response = match input.read_line(&mut line).await {
            Ok(0) | Err(_) => parse_reply(None),
            Ok(_) => parse_reply(Some(&line)),
        };

        debug!("Confirmation for '{}': {}", request.description, response.token());
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolgate_foundation::PermissionAction;

    #[test]
    fn test_only_exact_reply_approves() {
        assert_eq!(parse_reply(Some("approve\n")), ConfirmationResponse::Approve);
        assert_eq!(parse_reply(Some("approve\r\n")), ConfirmationResponse::Approve);
        assert_eq!(parse_reply(Some("y\n")), ConfirmationResponse::Deny);
        assert_eq!(parse_reply(Some(" approve\n")), ConfirmationResponse::Deny);
        assert_eq!(parse_reply(Some("APPROVE\n")), ConfirmationResponse::Deny);
        assert_eq!(parse_reply(None), ConfirmationResponse::Dismiss);
    }

    #[test]
    fn test_prompt_includes_detail() {
        let request = ConfirmationRequest::new(PermissionAction::execute("ls -la"))
            .with_detail("--- a/x\n+++ b/x\n");
        let prompt = render_prompt(&request);
        assert!(prompt.contains("ls -la"));
        assert!(prompt.contains("+++ b/x"));
        assert!(prompt.ends_with("anything else denies: "));
    }
}
