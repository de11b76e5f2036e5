//! Host Config - 실행 호스트 설정
//!
//! `config.json` (전역 `<config_dir>/toolgate/`, 프로젝트 `.toolgate/`)
//!
//! ```json
//! {
//!   "shell": "bash",
//!   "shellArgs": ["-c"],
//!   "agentMarkerEnv": "TOOLGATE_AGENT",
//!   "commandTimeoutSecs": 600,
//!   "confirmationTimeoutSecs": 300,
//!   "requestTimeoutSecs": 30,
//!   "maxOutputBytes": 30000
//! }
//! ```
//!
//! 모든 필드는 선택이다. 프로젝트 값이 전역 값을 덮어쓴다.

use crate::storage::JsonStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 설정 파일명
pub const CONFIG_FILE: &str = "config.json";

/// 에이전트 실행 표식 환경변수 기본 이름
pub const DEFAULT_AGENT_MARKER_ENV: &str = "TOOLGATE_AGENT";

const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 300;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_OUTPUT_BYTES: usize = 30_000;

/// 호스트 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfig {
    /// 셸 프로그램 (기본: Unix `sh`, Windows `cmd`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,

    /// 셸 인자 (명령 문자열 앞에 붙음)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell_args: Option<Vec<String>>,

    /// 에이전트 실행 표식 환경변수 이름
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_marker_env: Option<String>,

    /// 명령 실행 제한 시간 (없으면 무제한)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,

    /// 승인 대기 제한 시간 (0 이면 무제한)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_timeout_secs: Option<u64>,

    /// provider 요청 제한 시간
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// 보고서 본문 최대 바이트
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_bytes: Option<usize>,
}

impl HostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::new();

        if let Ok(global) = JsonStore::global() {
            if let Some(global_config) = global.load_optional::<HostConfig>(CONFIG_FILE)? {
                config.merge(global_config);
            }
        }

        config.merge(Self::load_project(root)?);
        Ok(config)
    }

    /// 프로젝트 설정만 로드 (없으면 기본값)
    pub fn load_project(root: impl AsRef<Path>) -> Result<Self> {
        let store = JsonStore::project(root);
        Ok(store.load_optional(CONFIG_FILE)?.unwrap_or_default())
    }

    /// 프로젝트 설정 저장
    pub fn save_project(&self, root: impl AsRef<Path>) -> Result<()> {
        JsonStore::project(root).save(CONFIG_FILE, self)
    }

    /// 다른 설정과 병합 (other가 우선)
    pub fn merge(&mut self, other: HostConfig) {
        if other.shell.is_some() {
            self.shell = other.shell;
            // 셸이 바뀌면 이전 셸의 인자는 의미가 없다
            self.shell_args = None;
        }
        if other.shell_args.is_some() {
            self.shell_args = other.shell_args;
        }
        if other.agent_marker_env.is_some() {
            self.agent_marker_env = other.agent_marker_env;
        }
        if other.command_timeout_secs.is_some() {
            self.command_timeout_secs = other.command_timeout_secs;
        }
        if other.confirmation_timeout_secs.is_some() {
            self.confirmation_timeout_secs = other.confirmation_timeout_secs;
        }
        if other.request_timeout_secs.is_some() {
            self.request_timeout_secs = other.request_timeout_secs;
        }
        if other.max_output_bytes.is_some() {
            self.max_output_bytes = other.max_output_bytes;
        }
    }

    // ========================================================================
    // Resolved values
    // ========================================================================

    /// 셸 프로그램과 인자
    pub fn shell_command(&self) -> (String, Vec<String>) {
        let program = self.shell.clone().unwrap_or_else(default_shell);
        let args = self
            .shell_args
            .clone()
            .unwrap_or_else(|| default_shell_args(&program));
        (program, args)
    }

    pub fn agent_marker_env(&self) -> &str {
        self.agent_marker_env
            .as_deref()
            .unwrap_or(DEFAULT_AGENT_MARKER_ENV)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn confirmation_timeout(&self) -> Option<Duration> {
        match self
            .confirmation_timeout_secs
            .unwrap_or(DEFAULT_CONFIRMATION_TIMEOUT_SECS)
        {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// 0 은 기본값으로 취급
    pub fn max_output_bytes(&self) -> usize {
        match self.max_output_bytes {
            Some(0) | None => DEFAULT_MAX_OUTPUT_BYTES,
            Some(limit) => limit,
        }
    }
}

fn default_shell() -> String {
    if cfg!(windows) {
        "cmd".to_string()
    } else {
        "sh".to_string()
    }
}

/// 셸 이름으로 명령 전달 인자 추정
fn default_shell_args(program: &str) -> Vec<String> {
    let name = Path::new(program)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(program)
        .to_ascii_lowercase();

    match name.as_str() {
        "cmd" => vec!["/C".to_string()],
        "powershell" | "pwsh" => vec!["-NoProfile".to_string(), "-Command".to_string()],
        _ => vec!["-c".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HostConfig::new();
        assert_eq!(config.agent_marker_env(), "TOOLGATE_AGENT");
        assert_eq!(config.command_timeout(), None);
        assert_eq!(config.confirmation_timeout(), Some(Duration::from_secs(300)));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_output_bytes(), 30_000);

        #[cfg(unix)]
        assert_eq!(
            config.shell_command(),
            ("sh".to_string(), vec!["-c".to_string()])
        );
    }

    #[test]
    fn test_shell_args_follow_shell() {
        let config = HostConfig {
            shell: Some("pwsh".into()),
            ..Default::default()
        };
        let (program, args) = config.shell_command();
        assert_eq!(program, "pwsh");
        assert_eq!(args, vec!["-NoProfile", "-Command"]);

        let config = HostConfig {
            shell: Some("C:\\Windows\\System32\\cmd.exe".into()),
            ..Default::default()
        };
        assert_eq!(config.shell_command().1, vec!["/C"]);
    }

    #[test]
    fn test_merge_project_wins() {
        let mut config = HostConfig {
            shell: Some("bash".into()),
            shell_args: Some(vec!["-lc".into()]),
            request_timeout_secs: Some(10),
            ..Default::default()
        };
        config.merge(HostConfig {
            shell: Some("zsh".into()),
            max_output_bytes: Some(100),
            ..Default::default()
        });

        assert_eq!(config.shell_command(), ("zsh".into(), vec!["-c".into()]));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.max_output_bytes(), 100);
    }

    #[test]
    fn test_zero_output_limit_falls_back_to_default() {
        let config = HostConfig {
            max_output_bytes: Some(0),
            ..Default::default()
        };
        assert_eq!(config.max_output_bytes(), 30_000);
    }

    #[test]
    fn test_zero_confirmation_timeout_waits_forever() {
        let config = HostConfig {
            confirmation_timeout_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(config.confirmation_timeout(), None);
    }

    #[test]
    fn test_project_file_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::project(dir.path());
        std::fs::create_dir_all(store.base_dir()).unwrap();
        std::fs::write(
            store.file_path(CONFIG_FILE),
            r#"{ "agentMarkerEnv": "MY_AGENT", "commandTimeoutSecs": 5 }"#,
        )
        .unwrap();

        let config = HostConfig::load_project(dir.path()).unwrap();
        assert_eq!(config.agent_marker_env(), "MY_AGENT");
        assert_eq!(config.command_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_missing_project_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(HostConfig::load_project(dir.path()).unwrap(), HostConfig::new());
    }
}
