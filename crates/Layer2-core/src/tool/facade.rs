//! Tool Execution Facade - 도구 호출 단일 진입점
//!
//! `<provider>__<tool>` 형식 이름은 provider 레지스트리로, 나머지는 내장
//! 도구 레지스트리로 보낸다. 어느 쪽이든 같은 [`ToolResult`] 모양으로 돌아온다.

use super::context::RuntimeContext;
use super::registry::ToolRegistry;
use crate::mcp::ProviderRegistry;
use crate::process::{CancelHandle, ChunkSink};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use toolgate_foundation::{
    CommandGate, ConfirmationDelegate, HostConfig, ToolCallRequest, ToolResult, ToolSource,
};
use tracing::info;

/// 도구 실행 파사드
pub struct ToolExecutionFacade {
    tools: ToolRegistry,
    providers: Arc<ProviderRegistry>,
    context: RuntimeContext,
}

impl ToolExecutionFacade {
    /// 설정과 승인 델리게이트로 전체 구성
    pub fn new(
        root: impl Into<PathBuf>,
        delegate: Arc<dyn ConfirmationDelegate>,
        config: &HostConfig,
    ) -> Self {
        let root = root.into();
        let gate =
            CommandGate::new(delegate).with_confirmation_timeout(config.confirmation_timeout());
        let context = RuntimeContext::from_config(root.clone(), gate.clone(), config);
        let providers = Arc::new(ProviderRegistry::from_config(root, gate, config));
        Self::from_parts(ToolRegistry::with_builtins(), providers, context)
    }

    pub fn from_parts(
        tools: ToolRegistry,
        providers: Arc<ProviderRegistry>,
        context: RuntimeContext,
    ) -> Self {
        Self {
            tools,
            providers,
            context,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn providers(&self) -> &Arc<ProviderRegistry> {
        &self.providers
    }

    pub fn context(&self) -> &RuntimeContext {
        &self.context
    }

    /// 도구 호출
    pub async fn execute(
        &self,
        request: ToolCallRequest,
        sink: Option<ChunkSink>,
        cancel: CancelHandle,
    ) -> ToolResult {
        info!("Tool call: {}", request.source().display_name());

        match request.source() {
            ToolSource::Provider { .. } => {
                self.providers
                    .execute_tool(&request.name, request.arguments)
                    .await
            }
            ToolSource::Builtin { name } => {
                let ctx = self.context.for_call(sink, cancel);
                self.tools.execute(&name, request.arguments, &ctx).await
            }
        }
    }

    /// 승인 후 shell 명령 실행
    pub async fn run_command(
        &self,
        command: &str,
        sink: Option<ChunkSink>,
        cancel: CancelHandle,
    ) -> ToolResult {
        let request = ToolCallRequest::new("run_command", json!({ "command": command }));
        self.execute(request, sink, cancel).await
    }

    /// 내장 도구와 provider 도구 정의 전체
    pub async fn tool_definitions(&self) -> Vec<Value> {
        let mut definitions = self.tools.definitions();
        definitions.extend(
            self.providers
                .get_tools_for_ai()
                .await
                .iter()
                .map(|tool| tool.definition()),
        );
        definitions
    }
}

impl std::fmt::Debug for ToolExecutionFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolExecutionFacade")
            .field("tools", &self.tools)
            .field("providers", &self.providers)
            .finish()
    }
}
