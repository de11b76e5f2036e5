//! Provider Registry - provider 연결 묶음 관리
//!
//! ## 수명 주기
//! - `startup`: manifest 읽기 → 항목별 검증 → 통과한 항목만 연결
//! - `shutdown`: 모든 연결 종료 후 비움
//! - `reload`: 같은 lifecycle 잠금 안에서 shutdown 후 startup
//!
//! 연결 맵은 lifecycle 작업만 바꾼다. 새 맵은 옆에서 만든 뒤 한 번에 교체되므로
//! 조회 쪽은 항상 완성된 맵만 본다.
//!
//! ## 연결 상태
//! ```text
//! Configured → Validating → Invalid
//!                         → Connecting → Connected → Disconnected
//!                                      → Failed
//! ```

use super::client::McpClient;
use super::transport::DEFAULT_REQUEST_TIMEOUT;
use super::types::{
    GetPromptResult, McpToolCall, ProviderPrompt, ProviderResource, ProviderTool,
    ReadResourceResult,
};
use crate::tool::schema::validate_arguments;
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use toolgate_foundation::{
    CommandGate, Error, HostConfig, LaunchSpec, McpManifest, Result, ToolResult,
    NAMESPACE_SEPARATOR,
};
use tracing::{debug, error, info, warn};

/// provider 프로세스 연결기
#[async_trait]
pub trait ProviderConnector: Send + Sync {
    /// 검증이 끝난 launch spec 으로 연결 (핸드셰이크 포함)
    async fn connect(&self, name: &str, spec: &LaunchSpec) -> Result<McpClient>;
}

/// stdio 로 provider 프로세스를 띄우는 기본 연결기
#[derive(Debug, Clone)]
pub struct StdioConnector {
    cwd: Option<PathBuf>,
    timeout: Duration,
}

impl StdioConnector {
    pub fn new(cwd: Option<PathBuf>, timeout: Duration) -> Self {
        Self { cwd, timeout }
    }
}

#[async_trait]
impl ProviderConnector for StdioConnector {
    async fn connect(&self, name: &str, spec: &LaunchSpec) -> Result<McpClient> {
        McpClient::connect(name, spec, self.cwd.as_deref(), self.timeout).await
    }
}

/// provider 연결 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Configured,
    Validating,
    /// 검증 실패로 건너뜀
    Invalid { reason: String },
    Connecting,
    Connected,
    /// 연결 실패 (재시도 없음)
    Failed { reason: String },
    Disconnected,
}

impl ConnectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Invalid { .. } | Self::Failed { .. } | Self::Disconnected
        )
    }
}

/// startup 결과 요약
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupReport {
    pub connected: Vec<String>,
    /// (이름, 이유)
    pub invalid: Vec<(String, String)>,
    /// (이름, 이유)
    pub failed: Vec<(String, String)>,
    pub disabled: Vec<String>,
}

/// provider 레지스트리
pub struct ProviderRegistry {
    root: PathBuf,
    connector: Arc<dyn ProviderConnector>,
    gate: CommandGate,
    clients: RwLock<HashMap<String, Arc<McpClient>>>,
    states: parking_lot::RwLock<BTreeMap<String, ConnectionState>>,
    /// startup/shutdown/reload 직렬화
    lifecycle: Mutex<()>,
}

impl ProviderRegistry {
    /// stdio 연결기로 생성
    pub fn new(root: impl Into<PathBuf>, gate: CommandGate) -> Self {
        let root = root.into();
        let connector = StdioConnector::new(Some(root.clone()), DEFAULT_REQUEST_TIMEOUT);
        Self::with_connector(root, gate, Arc::new(connector))
    }

    /// 설정 파일의 요청 타임아웃 적용
    pub fn from_config(root: impl Into<PathBuf>, gate: CommandGate, config: &HostConfig) -> Self {
        let root = root.into();
        let connector = StdioConnector::new(Some(root.clone()), config.request_timeout());
        Self::with_connector(root, gate, Arc::new(connector))
    }

    pub fn with_connector(
        root: impl Into<PathBuf>,
        gate: CommandGate,
        connector: Arc<dyn ProviderConnector>,
    ) -> Self {
        Self {
            root: root.into(),
            connector,
            gate,
            clients: RwLock::new(HashMap::new()),
            states: parking_lot::RwLock::new(BTreeMap::new()),
            lifecycle: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// manifest 를 읽고 유효한 provider 를 모두 연결
    ///
    /// manifest 자체를 읽을 수 없으면 `Config` 에러.
    pub async fn startup(&self) -> Result<StartupReport> {
        let _guard = self.lifecycle.lock().await;
        self.startup_locked().await
    }

    /// 모든 연결 종료
    pub async fn shutdown(&self) {
        let _guard = self.lifecycle.lock().await;
        self.shutdown_locked().await;
    }

    /// shutdown 후 startup
    pub async fn reload(&self) -> Result<StartupReport> {
        let _guard = self.lifecycle.lock().await;
        info!("Reloading providers");
        self.shutdown_locked().await;
        self.startup_locked().await
    }

    async fn startup_locked(&self) -> Result<StartupReport> {
        let manifest = McpManifest::load(&self.root)?;
        let mut report = StartupReport::default();

        {
            let mut states = self.states.write();
            states.clear();
            for (name, spec) in manifest.iter() {
                if spec.enabled {
                    states.insert(name.clone(), ConnectionState::Configured);
                } else {
                    report.disabled.push(name.clone());
                }
            }
            for (name, reason) in &manifest.malformed {
                warn!("Skipping provider '{}': {}", name, reason);
                states.insert(name.clone(), ConnectionState::Invalid { reason: reason.clone() });
                report.invalid.push((name.clone(), reason.clone()));
            }
        }

        let mut candidates = Vec::new();
        for (name, spec) in manifest.iter_enabled() {
            self.set_state(name, ConnectionState::Validating);
            match spec.validate(name) {
                Ok(()) => candidates.push((name.clone(), spec.clone())),
                Err(reason) => {
                    warn!("Skipping provider '{}': {}", name, reason);
                    self.set_state(name, ConnectionState::Invalid { reason: reason.clone() });
                    report.invalid.push((name.clone(), reason));
                }
            }
        }

        let attempts = candidates.into_iter().map(|(name, spec)| async move {
            self.set_state(&name, ConnectionState::Connecting);
            let outcome = self.connector.connect(&name, &spec).await;
            (name, outcome)
        });

        let mut connected = HashMap::new();
        for (name, outcome) in join_all(attempts).await {
            match outcome {
                Ok(client) => {
                    info!("Provider '{}' connected", name);
                    self.set_state(&name, ConnectionState::Connected);
                    report.connected.push(name.clone());
                    connected.insert(name, Arc::new(client));
                }
                Err(e) => {
                    error!("Provider '{}' failed to connect: {}", name, e);
                    let reason = e.to_string();
                    self.set_state(&name, ConnectionState::Failed { reason: reason.clone() });
                    report.failed.push((name, reason));
                }
            }
        }

        let previous = std::mem::replace(&mut *self.clients.write().await, connected);
        close_all(previous).await;

        report.connected.sort();
        info!(
            "Providers ready: {} connected, {} invalid, {} failed",
            report.connected.len(),
            report.invalid.len(),
            report.failed.len()
        );
        Ok(report)
    }

    async fn shutdown_locked(&self) {
        let previous = std::mem::take(&mut *self.clients.write().await);
        let names: Vec<String> = previous.keys().cloned().collect();
        close_all(previous).await;

        let mut states = self.states.write();
        for name in names {
            states.insert(name, ConnectionState::Disconnected);
        }
    }

    fn set_state(&self, name: &str, state: ConnectionState) {
        debug!("Provider '{}' -> {:?}", name, state);
        self.states.write().insert(name.to_string(), state);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// 연결된 provider 이름 (정렬)
    pub async fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clients.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn connection_state(&self, name: &str) -> Option<ConnectionState> {
        self.states.read().get(name).cloned()
    }

    pub fn connection_states(&self) -> BTreeMap<String, ConnectionState> {
        self.states.read().clone()
    }

    async fn client(&self, provider: &str) -> Option<Arc<McpClient>> {
        self.clients.read().await.get(provider).cloned()
    }

    async fn snapshot(&self) -> Vec<Arc<McpClient>> {
        self.clients.read().await.values().cloned().collect()
    }

    /// 모든 provider 의 도구 (`<provider>__<tool>` 순 정렬)
    pub async fn get_tools_for_ai(&self) -> Vec<ProviderTool> {
        let clients = self.snapshot().await;
        let lists = join_all(clients.iter().map(|client| async move {
            match client.list_tools().await {
                Ok(tools) => tools
                    .into_iter()
                    .filter(|tool| !tool.name.is_empty() && !tool.name.contains(NAMESPACE_SEPARATOR))
                    .map(|tool| ProviderTool {
                        provider: client.name().to_string(),
                        tool,
                    })
                    .collect(),
                Err(e) => {
                    warn!("Failed to list tools from '{}': {}", client.name(), e);
                    Vec::new()
                }
            }
        }))
        .await;

        let mut tools: Vec<ProviderTool> = lists.into_iter().flatten().collect();
        tools.sort_by_key(|t| t.exposed_name());
        tools
    }

    /// 모든 provider 의 프롬프트
    pub async fn get_prompts_for_ai(&self) -> Vec<ProviderPrompt> {
        let clients = self.snapshot().await;
        let lists = join_all(clients.iter().map(|client| async move {
            match client.list_prompts().await {
                Ok(prompts) => prompts
                    .into_iter()
                    .map(|prompt| ProviderPrompt {
                        provider: client.name().to_string(),
                        prompt,
                    })
                    .collect(),
                Err(e) => {
                    warn!("Failed to list prompts from '{}': {}", client.name(), e);
                    Vec::new()
                }
            }
        }))
        .await;

        let mut prompts: Vec<ProviderPrompt> = lists.into_iter().flatten().collect();
        prompts.sort_by(|a, b| (&a.provider, &a.prompt.name).cmp(&(&b.provider, &b.prompt.name)));
        prompts
    }

    /// 모든 provider 의 리소스
    pub async fn get_resources_for_ai(&self) -> Vec<ProviderResource> {
        let clients = self.snapshot().await;
        let lists = join_all(clients.iter().map(|client| async move {
            match client.list_resources().await {
                Ok(resources) => resources
                    .into_iter()
                    .map(|resource| ProviderResource {
                        provider: client.name().to_string(),
                        resource,
                    })
                    .collect(),
                Err(e) => {
                    warn!("Failed to list resources from '{}': {}", client.name(), e);
                    Vec::new()
                }
            }
        }))
        .await;

        let mut resources: Vec<ProviderResource> = lists.into_iter().flatten().collect();
        resources.sort_by(|a, b| (&a.provider, &a.resource.uri).cmp(&(&b.provider, &b.resource.uri)));
        resources
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// `<provider>__<tool>` 호출
    ///
    /// 이름 형식이 틀리면 어떤 연결도 건드리지 않는다.
    /// 인자는 provider 가 밝힌 스키마로 검증하고, 승인 후에만 전송한다.
    pub async fn execute_tool(&self, name: &str, arguments: Value) -> ToolResult {
        let Some((provider, tool)) = split_tool_name(name) else {
            return ToolResult::from_error(&Error::InvalidInput(format!(
                "Invalid provider tool name '{}': expected <provider>{}<tool>",
                name, NAMESPACE_SEPARATOR
            )));
        };

        let Some(client) = self.client(provider).await else {
            return ToolResult::from_error(&Error::NotFound(format!(
                "Provider not connected: {}",
                provider
            )));
        };

        match client.find_tool(tool).await {
            Ok(Some(descriptor)) => {
                if let Err(e) = validate_arguments(&descriptor.input_schema, &arguments) {
                    return ToolResult::from_error(&e);
                }
            }
            Ok(None) => {
                return ToolResult::from_error(&Error::NotFound(format!(
                    "Tool '{}' not found on provider '{}'",
                    tool, provider
                )));
            }
            Err(e) => {
                warn!("Cannot resolve tool '{}' on '{}': {}", tool, provider, e);
                return ToolResult::from_error(&e);
            }
        }

        client
            .call_tool_gated(&self.gate, &McpToolCall::new(tool, arguments))
            .await
            .with_metadata("provider", json!(provider))
            .with_metadata("tool", json!(tool))
    }

    /// prompts/get
    pub async fn get_prompt(
        &self,
        provider: &str,
        name: &str,
        arguments: Option<Value>,
    ) -> Result<GetPromptResult> {
        let client = self.require(provider).await?;
        client.get_prompt(name, arguments).await
    }

    /// resources/read
    pub async fn read_resource(&self, provider: &str, uri: &str) -> Result<ReadResourceResult> {
        let client = self.require(provider).await?;
        client.read_resource(uri).await
    }

    async fn require(&self, provider: &str) -> Result<Arc<McpClient>> {
        self.client(provider)
            .await
            .ok_or_else(|| Error::NotFound(format!("Provider not connected: {}", provider)))
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("root", &self.root)
            .field("states", &*self.states.read())
            .finish()
    }
}

/// 첫 번째 `__` 에서 분리. 어느 쪽이든 비어 있으면 `None`.
fn split_tool_name(name: &str) -> Option<(&str, &str)> {
    let (provider, tool) = name.split_once(NAMESPACE_SEPARATOR)?;
    if provider.is_empty() || tool.is_empty() {
        return None;
    }
    Some((provider, tool))
}

async fn close_all(clients: HashMap<String, Arc<McpClient>>) {
    let closing = clients.into_iter().map(|(name, client)| async move {
        if let Err(e) = client.close().await {
            warn!("Error closing provider '{}': {}", name, e);
        }
    });
    join_all(closing).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::client::tests::ScriptedTransport;
    use std::collections::HashSet;
    use toolgate_foundation::{ActionState, FixedConfirmation};

    /// 연결 시도를 기록하고 가짜 전송 계층을 돌려주는 연결기
    #[derive(Default)]
    struct FakeConnector {
        attempts: parking_lot::Mutex<Vec<String>>,
        transports: parking_lot::Mutex<HashMap<String, Arc<ScriptedTransport>>>,
        failing: HashSet<String>,
        broken_listing: HashSet<String>,
    }

    impl FakeConnector {
        fn attempts(&self) -> Vec<String> {
            let mut attempts = self.attempts.lock().clone();
            attempts.sort();
            attempts
        }

        fn transport(&self, name: &str) -> Arc<ScriptedTransport> {
            self.transports.lock()[name].clone()
        }
    }

    #[async_trait]
    impl ProviderConnector for FakeConnector {
        async fn connect(&self, name: &str, _spec: &LaunchSpec) -> Result<McpClient> {
            self.attempts.lock().push(name.to_string());
            if self.failing.contains(name) {
                return Err(Error::Spawn(format!("{}: exited during handshake", name)));
            }

            let tools = if self.broken_listing.contains(name) {
                Err(Error::Protocol("boom".into()))
            } else {
                Ok(json!({ "tools": [{
                    "name": "toolX",
                    "description": "does x",
                    "inputSchema": {
                        "type": "object",
                        "properties": { "q": { "type": "string" } },
                        "required": ["q"]
                    }
                }]}))
            };
            let transport = Arc::new(ScriptedTransport::new(vec![
                ("tools/list", tools),
                (
                    "tools/call",
                    Ok(json!({ "content": [{ "type": "text", "text": format!("{} ran", name) }] })),
                ),
            ]));
            self.transports.lock().insert(name.to_string(), transport.clone());
            Ok(McpClient::with_transport(name, transport))
        }
    }

    fn write_manifest(root: &Path, entries: &[(&str, LaunchSpec)]) {
        let mut manifest = McpManifest::new();
        for (name, spec) in entries {
            manifest.add(*name, spec.clone());
        }
        manifest.save(root).unwrap();
    }

    fn registry(
        root: &Path,
        connector: Arc<FakeConnector>,
        confirmation: FixedConfirmation,
    ) -> ProviderRegistry {
        ProviderRegistry::with_connector(
            root,
            CommandGate::new(Arc::new(confirmation)),
            connector,
        )
    }

    #[tokio::test]
    async fn test_disallowed_command_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            &[
                ("web", LaunchSpec::new("curl").arg("http://example.com")),
                ("local", LaunchSpec::new("node").arg("server.js")),
            ],
        );
        let connector = Arc::new(FakeConnector::default());
        let registry = registry(dir.path(), connector.clone(), FixedConfirmation::approve());

        let report = registry.startup().await.unwrap();

        assert_eq!(report.connected, vec!["local".to_string()]);
        assert_eq!(report.invalid.len(), 1);
        assert_eq!(report.invalid[0].0, "web");
        assert_eq!(connector.attempts(), vec!["local".to_string()]);
        assert!(matches!(
            registry.connection_state("web"),
            Some(ConnectionState::Invalid { .. })
        ));

        let names: Vec<String> = registry
            .get_tools_for_ai()
            .await
            .iter()
            .map(ProviderTool::exposed_name)
            .collect();
        assert_eq!(names, vec!["local__toolX".to_string()]);
    }

    #[tokio::test]
    async fn test_unsafe_argument_fails_before_any_transport() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            &[("evil", LaunchSpec::new("node").arg("server.js").arg("; rm -rf ~"))],
        );
        let connector = Arc::new(FakeConnector::default());
        let registry = registry(dir.path(), connector.clone(), FixedConfirmation::approve());

        let report = registry.startup().await.unwrap();

        assert!(report.connected.is_empty());
        assert_eq!(report.invalid[0].0, "evil");
        assert!(connector.attempts().is_empty());
    }

    #[tokio::test]
    async fn test_namespaced_call_routes_to_provider() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            &[
                ("serverA", LaunchSpec::new("node").arg("a.js")),
                ("serverB", LaunchSpec::new("python3").arg("b.py")),
            ],
        );
        let connector = Arc::new(FakeConnector::default());
        let registry = registry(dir.path(), connector.clone(), FixedConfirmation::approve());
        registry.startup().await.unwrap();

        let result = registry
            .execute_tool("serverA__toolX", json!({ "q": "hi" }))
            .await;

        assert!(result.success, "{}", result.to_text());
        assert_eq!(result.output, "serverA ran");

        let calls = connector.transport("serverA").calls.lock().clone();
        let (method, params) = calls.last().unwrap();
        assert_eq!(method, "tools/call");
        assert_eq!(params.as_ref().unwrap()["name"], "toolX");
        assert!(!connector.transport("serverB").methods().contains(&"tools/call".to_string()));
    }

    #[tokio::test]
    async fn test_malformed_name_touches_no_connection() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), &[("serverA", LaunchSpec::new("node").arg("a.js"))]);
        let connector = Arc::new(FakeConnector::default());
        let registry = registry(dir.path(), connector.clone(), FixedConfirmation::approve());
        registry.startup().await.unwrap();

        for name in ["badname", "__toolX", "serverA__"] {
            let result = registry.execute_tool(name, json!({})).await;
            assert!(!result.success);
            assert!(result.to_text().contains("expected <provider>__<tool>"));
        }
        assert!(connector.transport("serverA").methods().is_empty());
    }

    #[tokio::test]
    async fn test_schema_and_denial_stop_before_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), &[("serverA", LaunchSpec::new("node").arg("a.js"))]);
        let connector = Arc::new(FakeConnector::default());
        let registry = registry(dir.path(), connector.clone(), FixedConfirmation::deny());
        registry.startup().await.unwrap();

        let invalid = registry.execute_tool("serverA__toolX", json!({})).await;
        assert!(invalid.to_text().contains("missing required argument 'q'"));

        let denied = registry
            .execute_tool("serverA__toolX", json!({ "q": "hi" }))
            .await;
        assert_eq!(denied.state, ActionState::Denied);
        assert!(!connector.transport("serverA").methods().contains(&"tools/call".to_string()));
    }

    #[tokio::test]
    async fn test_failures_are_contained_per_provider() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            &[
                ("down", LaunchSpec::new("npx").arg("down-server")),
                ("flaky", LaunchSpec::new("uv").arg("run")),
                ("ok", LaunchSpec::new("node").arg("ok.js")),
            ],
        );
        let connector = Arc::new(FakeConnector {
            failing: HashSet::from(["down".to_string()]),
            broken_listing: HashSet::from(["flaky".to_string()]),
            ..Default::default()
        });
        let registry = registry(dir.path(), connector.clone(), FixedConfirmation::approve());

        let report = registry.startup().await.unwrap();
        assert_eq!(report.connected, vec!["flaky".to_string(), "ok".to_string()]);
        assert_eq!(report.failed[0].0, "down");
        assert!(matches!(
            registry.connection_state("down"),
            Some(ConnectionState::Failed { .. })
        ));

        let tools = registry.get_tools_for_ai().await;
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].provider, "ok");
    }

    #[tokio::test]
    async fn test_reload_twice_matches_single_startup() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            &[
                ("a", LaunchSpec::new("node").arg("a.js")),
                ("b", LaunchSpec::new("python").arg("b.py")),
                ("off", LaunchSpec::new("node").arg("off.js").disabled()),
            ],
        );
        let connector = Arc::new(FakeConnector::default());
        let registry = registry(dir.path(), connector.clone(), FixedConfirmation::approve());

        let first = registry.startup().await.unwrap();
        let first_names = registry.provider_names().await;
        let stale = connector.transport("a");

        registry.reload().await.unwrap();
        let report = registry.reload().await.unwrap();

        assert_eq!(registry.provider_names().await, first_names);
        assert_eq!(report.connected, first.connected);
        assert_eq!(report.disabled, vec!["off".to_string()]);
        assert!(!stale.connected.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(registry.connection_state("a"), Some(ConnectionState::Connected));

        registry.shutdown().await;
        assert!(registry.provider_names().await.is_empty());
        assert_eq!(registry.connection_state("b"), Some(ConnectionState::Disconnected));
    }

    #[tokio::test]
    async fn test_malformed_entry_is_skipped_and_others_connect() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join(".toolgate");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("mcp.json"),
            r#"{"mcpServers":{"bad":{"command":"node","args":["--port",8080]},"good":{"command":"node","args":["server.js"]}}}"#,
        )
        .unwrap();
        let connector = Arc::new(FakeConnector::default());
        let registry = registry(dir.path(), connector.clone(), FixedConfirmation::approve());

        let report = registry.startup().await.unwrap();

        assert_eq!(report.connected, vec!["good".to_string()]);
        assert_eq!(report.invalid.len(), 1);
        assert_eq!(report.invalid[0].0, "bad");
        assert_eq!(connector.attempts(), vec!["good".to_string()]);
        assert!(matches!(
            registry.connection_state("bad"),
            Some(ConnectionState::Invalid { .. })
        ));
    }

    #[tokio::test]
    async fn test_unparseable_manifest_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join(".toolgate");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join("mcp.json"), "{ not json").unwrap();
        let connector = Arc::new(FakeConnector::default());
        let registry = registry(dir.path(), connector.clone(), FixedConfirmation::approve());

        let err = registry.startup().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{:?}", err);
        assert!(connector.attempts().is_empty());
    }

    #[tokio::test]
    async fn test_missing_manifest_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ProviderRegistry::new(
            dir.path(),
            CommandGate::new(Arc::new(FixedConfirmation::approve())),
        );
        let report = registry.startup().await.unwrap();
        assert_eq!(report, StartupReport::default());
        assert!(registry.get_tools_for_ai().await.is_empty());
    }
}
