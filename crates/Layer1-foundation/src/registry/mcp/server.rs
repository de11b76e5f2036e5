use crate::core::NAMESPACE_SEPARATOR;
use crate::permission::validate_launch;
use crate::storage::JsonStore;
use crate::Result;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// 설정 파일명 (`<root>/.toolgate/mcp.json`)
pub const MCP_FILE: &str = "mcp.json";

/// 개별 provider 실행 명세
///
/// ```json
/// {
///   "command": "npx",
///   "args": ["-y", "@modelcontextprotocol/server-filesystem", "/path"],
///   "env": { "KEY": "${HOME}/data" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LaunchSpec {
    /// 실행 명령어 (허용 목록과 정확히 일치해야 함)
    pub command: String,

    /// 명령어 인자
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// 환경 변수 (${VAR}, ${VAR:-default} 형식 지원)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// 활성화 여부
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub enabled: bool,
}

impl LaunchSpec {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: vec![],
            env: BTreeMap::new(),
            enabled: true,
        }
    }

    // === Builder methods ===

    pub fn args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// 실행 전 검증
    ///
    /// provider 이름, 명령 허용 목록, 인자 안전 패턴을 모두 확인한다.
    pub fn validate(&self, name: &str) -> std::result::Result<(), String> {
        validate_provider_name(name)?;
        validate_launch(&self.command, &self.args)
    }

    /// 환경변수 확장 (${VAR} 또는 ${VAR:-default})
    pub fn expand_env(&self) -> BTreeMap<String, String> {
        self.env
            .iter()
            .map(|(k, v)| (k.clone(), expand_env_var(v)))
            .collect()
    }
}

/// provider 이름 검증
///
/// 비어 있거나 네임스페이스 구분자(`__`)를 포함하면 안 된다.
pub fn validate_provider_name(name: &str) -> std::result::Result<(), String> {
    if name.trim().is_empty() {
        return Err("provider name must not be empty".to_string());
    }
    if name.contains(NAMESPACE_SEPARATOR) {
        return Err(format!(
            "provider name '{}' must not contain '{}'",
            name, NAMESPACE_SEPARATOR
        ));
    }
    Ok(())
}

/// provider 실행 목록 파일 구조
///
/// ```json
/// {
///   "mcpServers": {
///     "filesystem": {
///       "command": "npx",
///       "args": ["-y", "@modelcontextprotocol/server-filesystem", "/path"]
///     }
///   }
/// }
/// ```
///
/// 항목은 하나씩 해석한다. 형식이 잘못된 항목은 `malformed` 에 이유와 함께 남고
/// 나머지 항목은 그대로 쓸 수 있다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "RawManifest")]
pub struct McpManifest {
    /// provider 이름 -> 실행 명세 (이름 순 정렬)
    #[serde(default, rename = "mcpServers")]
    pub servers: BTreeMap<String, LaunchSpec>,

    /// 해석에 실패한 항목 (이름 -> 이유)
    #[serde(skip)]
    pub malformed: BTreeMap<String, String>,
}

/// 항목 단위 해석 전의 원본
///
/// `mcpServers` 가 객체가 아니면 여기서 실패한다.
#[derive(Deserialize)]
struct RawManifest {
    #[serde(default, rename = "mcpServers")]
    servers: BTreeMap<String, serde_json::Value>,
}

impl From<RawManifest> for McpManifest {
    fn from(raw: RawManifest) -> Self {
        let mut manifest = McpManifest::default();
        for (name, entry) in raw.servers {
            match serde_json::from_value::<LaunchSpec>(entry) {
                Ok(spec) => {
                    manifest.servers.insert(name, spec);
                }
                Err(e) => {
                    manifest.malformed.insert(name, format!("malformed entry: {}", e));
                }
            }
        }
        manifest
    }
}

impl McpManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// 서버 추가
    pub fn add(&mut self, name: impl Into<String>, spec: LaunchSpec) {
        self.servers.insert(name.into(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&LaunchSpec> {
        self.servers.get(name)
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// 전체 서버 목록
    pub fn iter(&self) -> impl Iterator<Item = (&String, &LaunchSpec)> {
        self.servers.iter()
    }

    /// 활성화된 서버만
    pub fn iter_enabled(&self) -> impl Iterator<Item = (&String, &LaunchSpec)> {
        self.servers.iter().filter(|(_, s)| s.enabled)
    }

    // === Storage 연동 ===

    /// 작업 영역의 `.toolgate/mcp.json` 로드 (없으면 빈 목록)
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let store = JsonStore::project(root);
        Ok(store.load_optional(MCP_FILE)?.unwrap_or_default())
    }

    /// 작업 영역의 `.toolgate/mcp.json` 저장
    pub fn save(&self, root: impl AsRef<Path>) -> Result<()> {
        JsonStore::project(root).save(MCP_FILE, self)
    }
}

static ENV_DEFAULT: OnceLock<Regex> = OnceLock::new();
static ENV_SIMPLE: OnceLock<Regex> = OnceLock::new();

/// 환경변수 확장
/// - ${VAR}: 환경변수 값
/// - ${VAR:-default}: 환경변수가 없으면 기본값
fn expand_env_var(value: &str) -> String {
    let re_default = ENV_DEFAULT.get_or_init(|| {
        Regex::new(r"\$\{([^}:]+):-([^}]*)\}").expect("env default pattern is a valid regex")
    });
    let re_simple = ENV_SIMPLE
        .get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env pattern is a valid regex"));

    let result = re_default.replace_all(value, |caps: &Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[2].to_string())
    });

    re_simple
        .replace_all(&result, |caps: &Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

fn default_true() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let json = r#"{
            "mcpServers": {
                "files": {
                    "command": "npx",
                    "args": ["-y", "@modelcontextprotocol/server-filesystem", "/tmp"]
                },
                "local": { "command": "node", "args": ["server.js"], "env": { "A": "1" } },
                "off": { "command": "uv", "enabled": false }
            }
        }"#;
        let manifest: McpManifest = serde_json::from_str(json).unwrap();

        assert_eq!(manifest.len(), 3);
        assert_eq!(manifest.get("local").unwrap().env.get("A").unwrap(), "1");
        let enabled: Vec<_> = manifest.iter_enabled().map(|(n, _)| n.as_str()).collect();
        assert_eq!(enabled, vec!["files", "local"]);
    }

    #[test]
    fn test_malformed_entry_does_not_hide_others() {
        let json = r#"{
            "mcpServers": {
                "bad": { "command": "node", "args": ["--port", 8080] },
                "nameless": { "args": ["x.js"] },
                "good": { "command": "node", "args": ["server.js"] }
            }
        }"#;
        let manifest: McpManifest = serde_json::from_str(json).unwrap();

        assert_eq!(manifest.len(), 1);
        assert!(manifest.get("good").is_some());
        assert_eq!(manifest.malformed.len(), 2);
        assert!(manifest.malformed["bad"].contains("malformed entry"));
        assert!(manifest.malformed.contains_key("nameless"));
    }

    #[test]
    fn test_unusable_server_table_fails_whole_manifest() {
        assert!(serde_json::from_str::<McpManifest>(r#"{ "mcpServers": [] }"#).is_err());
        assert!(serde_json::from_str::<McpManifest>("not json").is_err());
    }

    #[test]
    fn test_validate_launch_spec() {
        assert!(LaunchSpec::new("node").arg("server.js").validate("local").is_ok());
        assert!(LaunchSpec::new("curl").validate("web").is_err());
        assert!(LaunchSpec::new("npx")
            .arg("; rm -rf ~")
            .validate("evil")
            .is_err());
    }

    #[test]
    fn test_provider_name_rules() {
        assert!(validate_provider_name("github").is_ok());
        assert!(validate_provider_name("").is_err());
        assert!(validate_provider_name("my__server").is_err());
        assert!(LaunchSpec::new("node").validate("a__b").is_err());
    }

    #[test]
    fn test_env_expansion() {
        std::env::set_var("TOOLGATE_TEST_VAR", "test_value");

        let expanded = expand_env_var("prefix_${TOOLGATE_TEST_VAR}_suffix");
        assert_eq!(expanded, "prefix_test_value_suffix");

        let with_default = expand_env_var("${TOOLGATE_NONEXISTENT:-default_val}");
        assert_eq!(with_default, "default_val");

        assert_eq!(expand_env_var("${TOOLGATE_NONEXISTENT}"), "");

        std::env::remove_var("TOOLGATE_TEST_VAR");
    }

    #[test]
    fn test_load_and_save() {
        let dir = tempfile::tempdir().unwrap();
        assert!(McpManifest::load(dir.path()).unwrap().is_empty());

        let mut manifest = McpManifest::new();
        manifest.add("local", LaunchSpec::new("node").arg("server.js"));
        manifest.save(dir.path()).unwrap();

        let written =
            std::fs::read_to_string(dir.path().join(".toolgate").join(MCP_FILE)).unwrap();
        assert!(written.contains("mcpServers"));
        assert!(!written.contains("enabled"));

        assert_eq!(McpManifest::load(dir.path()).unwrap(), manifest);
    }
}
