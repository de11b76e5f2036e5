//! Security - 차단 명령어 및 provider 실행 허용 목록
//!
//! - 차단 명령어 탐지 (승인 프롬프트 이전, 빠른 억제용)
//! - provider 실행 명령 허용 목록
//! - provider 인자 안전 패턴
//!
//! 차단 목록은 권위 있는 보안 경계가 아니다. 통과한 모든 명령은
//! 반드시 승인 게이트를 거친다.

use regex::Regex;
use std::sync::OnceLock;

// ============================================================
// 차단 명령어
// ============================================================

/// 차단 패턴 정의
#[derive(Debug, Clone)]
pub struct ForbiddenPattern {
    pub pattern: PatternType,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub enum PatternType {
    /// 명령 문자열 어디에든 포함되면 매칭
    Contains(String),
}

impl ForbiddenPattern {
    pub fn contains(substring: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            pattern: PatternType::Contains(substring.into()),
            reason: reason.into(),
        }
    }

    /// 명령어가 이 패턴에 매칭되는지 확인
    pub fn matches(&self, command: &str) -> bool {
        match &self.pattern {
            PatternType::Contains(s) => command.contains(s.as_str()),
        }
    }
}

/// 고정 차단 목록
pub fn forbidden_patterns() -> Vec<ForbiddenPattern> {
    vec![
        ForbiddenPattern::contains("rm -rf /", "Root filesystem deletion"),
        ForbiddenPattern::contains("sudo ", "Privilege escalation"),
        ForbiddenPattern::contains(":(){ :|:& };:", "Fork bomb"),
    ]
}

static FORBIDDEN: OnceLock<Vec<ForbiddenPattern>> = OnceLock::new();

/// 차단 목록 검사
///
/// 매칭된 첫 패턴을 돌려준다.
pub fn check_forbidden(command: &str) -> Option<&'static ForbiddenPattern> {
    FORBIDDEN
        .get_or_init(forbidden_patterns)
        .iter()
        .find(|p| p.matches(command))
}

// ============================================================
// Provider 실행 허용 목록
// ============================================================

/// provider 프로세스로 실행할 수 있는 명령
pub const ALLOWED_LAUNCH_COMMANDS: &[&str] = &["npx", "node", "uv", "python", "python3"];

/// 단어 문자, 공백, `- . / = \ : @` 만 허용
const SAFE_ARGUMENT_PATTERN: &str = r"^[\w\s\-./=\\:@]*$";

static SAFE_ARGUMENT: OnceLock<Regex> = OnceLock::new();

fn safe_argument_regex() -> &'static Regex {
    SAFE_ARGUMENT.get_or_init(|| {
        Regex::new(SAFE_ARGUMENT_PATTERN).expect("safe argument pattern is a valid regex")
    })
}

/// 허용 목록에 있는 실행 명령인지 (정확히 일치)
pub fn is_allowed_launch_command(command: &str) -> bool {
    ALLOWED_LAUNCH_COMMANDS.contains(&command)
}

/// 인자가 안전 패턴을 만족하는지
pub fn is_safe_argument(arg: &str) -> bool {
    safe_argument_regex().is_match(arg)
}

/// 실행 명령과 인자 전체 검증
///
/// 하나라도 어긋나면 거절 사유를 돌려준다.
pub fn validate_launch(command: &str, args: &[String]) -> std::result::Result<(), String> {
    if !is_allowed_launch_command(command) {
        return Err(format!(
            "command '{}' is not allowed (allowed: {})",
            command,
            ALLOWED_LAUNCH_COMMANDS.join(", ")
        ));
    }

    if let Some(bad) = args.iter().find(|a| !is_safe_argument(a)) {
        return Err(format!("argument {:?} contains disallowed characters", bad));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_commands() {
        assert!(check_forbidden("rm -rf /").is_some());
        assert!(check_forbidden("cd /tmp && rm -rf / --no-preserve-root").is_some());
        assert!(check_forbidden("sudo apt install x").is_some());
        assert!(check_forbidden("make && sudo make install").is_some());
        assert!(check_forbidden(":(){ :|:& };:").is_some());

        assert!(check_forbidden("echo hello").is_none());
        assert!(check_forbidden("rm -rf build").is_none());
        assert!(check_forbidden("echo sudo").is_none());
    }

    #[test]
    fn test_forbidden_reason() {
        let pattern = check_forbidden(":(){ :|:& };:").unwrap();
        assert_eq!(pattern.reason, "Fork bomb");
    }

    #[test]
    fn test_launch_allow_list() {
        for cmd in ["npx", "node", "uv", "python", "python3"] {
            assert!(is_allowed_launch_command(cmd), "{} should be allowed", cmd);
        }
        assert!(!is_allowed_launch_command("curl"));
        assert!(!is_allowed_launch_command("bash"));
        assert!(!is_allowed_launch_command("/usr/bin/node"));
        assert!(!is_allowed_launch_command("node "));
    }

    #[test]
    fn test_safe_arguments() {
        assert!(is_safe_argument("server.js"));
        assert!(is_safe_argument("-y"));
        assert!(is_safe_argument("@modelcontextprotocol/server-filesystem"));
        assert!(is_safe_argument("C:\\Users\\me\\tools"));
        assert!(is_safe_argument("--port=8080"));
        assert!(is_safe_argument("user@host:path"));

        assert!(!is_safe_argument("; rm -rf ~"));
        assert!(!is_safe_argument("$(whoami)"));
        assert!(!is_safe_argument("a|b"));
        assert!(!is_safe_argument("`id`"));
        assert!(!is_safe_argument("a&&b"));
    }

    #[test]
    fn test_validate_launch() {
        assert!(validate_launch("node", &["server.js".to_string()]).is_ok());
        assert!(validate_launch("curl", &[]).is_err());

        let err = validate_launch("npx", &["-y".to_string(), "; rm -rf ~".to_string()])
            .unwrap_err();
        assert!(err.contains("disallowed"));
    }
}
