//! MCP Client - provider 하나와의 연결
//!
//! 요청마다 JSON-RPC 요청 하나를 보내고 응답 하나를 받는다.
//! 도구 호출은 반드시 승인 게이트를 먼저 통과한다.

use super::transport::{McpTransport, StdioTransport};
use super::types::{
    GetPromptResult, McpPrompt, McpResource, McpTool, McpToolCall, McpToolResult,
    ReadResourceResult,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use toolgate_foundation::{
    ActionState, CommandGate, ConfirmationRequest, Error, LaunchSpec, PermissionAction, Result,
    ToolResult,
};
use tracing::{debug, info, warn};

/// MCP 프로토콜 버전
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP 클라이언트 정보
#[derive(Debug, Clone, Serialize)]
struct ClientInfo {
    name: String,
    version: String,
}

/// MCP 서버 정보
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// Initialize 응답
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeResult {
    #[serde(default)]
    protocol_version: String,
    #[serde(default)]
    server_info: ServerInfo,
    #[serde(default)]
    capabilities: Value,
}

#[derive(Deserialize)]
struct ToolsListResult {
    #[serde(default)]
    tools: Vec<McpTool>,
}

#[derive(Deserialize)]
struct PromptsListResult {
    #[serde(default)]
    prompts: Vec<McpPrompt>,
}

#[derive(Deserialize)]
struct ResourcesListResult {
    #[serde(default)]
    resources: Vec<McpResource>,
}

/// MCP 클라이언트
pub struct McpClient {
    /// provider 이름 (manifest 키)
    name: String,

    /// 전송 계층
    transport: Arc<dyn McpTransport>,

    /// initialize 응답의 서버 정보
    server_info: parking_lot::RwLock<Option<ServerInfo>>,

    /// 마지막 tools/list 결과
    tools: parking_lot::RwLock<Option<Vec<McpTool>>>,
}

impl McpClient {
    /// 이미 열린 전송 계층으로 클라이언트 생성 (핸드셰이크 없음)
    pub fn with_transport(name: impl Into<String>, transport: Arc<dyn McpTransport>) -> Self {
        Self {
            name: name.into(),
            transport,
            server_info: parking_lot::RwLock::new(None),
            tools: parking_lot::RwLock::new(None),
        }
    }

    /// provider 프로세스를 띄우고 핸드셰이크까지 마친 클라이언트
    ///
    /// 검증은 호출자가 끝낸 상태여야 한다.
    pub async fn connect(
        name: &str,
        spec: &LaunchSpec,
        cwd: Option<&Path>,
        timeout: Duration,
    ) -> Result<Self> {
        info!("Connecting to provider: {}", name);

        let env = spec.expand_env();
        let transport =
            StdioTransport::spawn(name, &spec.command, &spec.args, &env, cwd, timeout).await?;
        let client = Self::with_transport(name, Arc::new(transport));

        if let Err(e) = client.initialize().await {
            let _ = client.close().await;
            return Err(e);
        }

        Ok(client)
    }

    /// 서버 이름
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 연결 상태
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn server_info(&self) -> Option<ServerInfo> {
        self.server_info.read().clone()
    }

    /// MCP initialize 핸드셰이크
    pub async fn initialize(&self) -> Result<()> {
        let params = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "clientInfo": ClientInfo {
                name: "toolgate".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            "capabilities": {}
        });

        let result = self.transport.request("initialize", Some(params)).await?;
        let init: InitializeResult = parse(&self.name, "initialize", result)?;

        if !init.protocol_version.is_empty() && init.protocol_version != MCP_PROTOCOL_VERSION {
            warn!(
                "Provider '{}' answered with protocol {} (requested {})",
                self.name, init.protocol_version, MCP_PROTOCOL_VERSION
            );
        }
        debug!(
            "Provider '{}' is {} v{} (capabilities: {})",
            self.name, init.server_info.name, init.server_info.version, init.capabilities
        );
        *self.server_info.write() = Some(init.server_info);

        self.transport
            .notify("notifications/initialized", None)
            .await
    }

    /// 연결 종료
    pub async fn close(&self) -> Result<()> {
        self.transport.close().await?;
        info!("Disconnected from provider: {}", self.name);
        Ok(())
    }

    /// tools/list
    pub async fn list_tools(&self) -> Result<Vec<McpTool>> {
        let result = self.transport.request("tools/list", None).await?;
        let list: ToolsListResult = parse(&self.name, "tools/list", result)?;
        debug!("Provider '{}' lists {} tools", self.name, list.tools.len());
        *self.tools.write() = Some(list.tools.clone());
        Ok(list.tools)
    }

    /// 도구 정보 조회 (캐시가 없으면 tools/list)
    pub async fn find_tool(&self, name: &str) -> Result<Option<McpTool>> {
        let cached = self.tools.read().clone();
        let tools = match cached {
            Some(tools) => tools,
            None => self.list_tools().await?,
        };
        Ok(tools.into_iter().find(|t| t.name == name))
    }

    /// prompts/list
    pub async fn list_prompts(&self) -> Result<Vec<McpPrompt>> {
        let result = self.transport.request("prompts/list", None).await?;
        let list: PromptsListResult = parse(&self.name, "prompts/list", result)?;
        Ok(list.prompts)
    }

    /// resources/list
    pub async fn list_resources(&self) -> Result<Vec<McpResource>> {
        let result = self.transport.request("resources/list", None).await?;
        let list: ResourcesListResult = parse(&self.name, "resources/list", result)?;
        Ok(list.resources)
    }

    /// prompts/get
    pub async fn get_prompt(&self, name: &str, arguments: Option<Value>) -> Result<GetPromptResult> {
        let params = json!({
            "name": name,
            "arguments": arguments.unwrap_or_else(|| json!({}))
        });
        let result = self.transport.request("prompts/get", Some(params)).await?;
        parse(&self.name, "prompts/get", result)
    }

    /// resources/read
    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult> {
        let params = json!({ "uri": uri });
        let result = self.transport.request("resources/read", Some(params)).await?;
        parse(&self.name, "resources/read", result)
    }

    /// tools/call (승인 없이 바로 전송)
    pub async fn call_tool(&self, call: &McpToolCall) -> Result<McpToolResult> {
        debug!("Calling {}/{} with {}", self.name, call.name, call.arguments);

        let params = json!({
            "name": call.name,
            "arguments": call.arguments
        });
        let result = self.transport.request("tools/call", Some(params)).await?;
        let tool_result: McpToolResult = parse(&self.name, "tools/call", result)?;

        if tool_result.is_error {
            warn!(
                "Provider tool '{}/{}' returned error: {:?}",
                self.name,
                call.name,
                tool_result.text()
            );
        }

        Ok(tool_result)
    }

    /// 승인 후 도구 호출
    ///
    /// 거부되면 provider 에 아무것도 보내지 않는다. 전송 실패도 결과 값으로 돌아온다.
    pub async fn call_tool_gated(&self, gate: &CommandGate, call: &McpToolCall) -> ToolResult {
        let request = ConfirmationRequest::new(PermissionAction::provider_tool(
            &self.name, &call.name,
        ))
        .with_detail(
            serde_json::to_string_pretty(&call.arguments).unwrap_or_else(|_| call.arguments.to_string()),
        );

        if let Err(e) = gate.authorize(request).await {
            return ToolResult::from_error(&e);
        }

        match self.call_tool(call).await {
            Ok(result) if result.is_error => {
                ToolResult::error(result.joined_text()).with_state(ActionState::Closed)
            }
            Ok(result) => ToolResult::success(result.joined_text()),
            Err(e) => {
                warn!("Provider tool '{}/{}' failed: {}", self.name, call.name, e);
                ToolResult::from_error(&e)
            }
        }
    }
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient")
            .field("name", &self.name)
            .field("connected", &self.is_connected())
            .finish()
    }
}

fn parse<T: DeserializeOwned>(provider: &str, method: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        Error::Protocol(format!(
            "invalid {} response from '{}': {}",
            method, provider, e
        ))
    })
}
