//! run_command - Shell 명령 실행 도구
//!
//! - 금지 패턴은 승인 프롬프트 없이 즉시 거절
//! - 그 외 모든 명령은 사람의 승인 후에만 실행
//! - 출력 청크는 컨텍스트의 수신자로 바로 전달
//! - 실행 위치는 작업 영역 안으로 제한

use crate::process::ExecutionReport;
use crate::tool::traits::{Tool, ToolContext};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use toolgate_foundation::{Error, Result, ToolMeta, ToolResult};
use tracing::{info, warn};

/// run_command 입력
#[derive(Debug, Deserialize)]
pub struct RunCommandInput {
    /// 실행할 명령어
    pub command: String,

    /// 작업 영역 기준 실행 위치 (기본: 루트)
    #[serde(default)]
    pub cwd: Option<String>,
}

/// Shell 명령 실행 도구
#[derive(Debug, Default)]
pub struct RunCommandTool;

impl RunCommandTool {
    pub const NAME: &'static str = "run_command";

    pub fn new() -> Self {
        Self
    }

    fn into_result(report: ExecutionReport) -> ToolResult {
        let rendered = report.render();
        let mut result = if report.status.is_success() {
            ToolResult::success(rendered)
        } else {
            ToolResult::error(report.status.label()).with_output(rendered)
        };
        result = result
            .with_state(report.status.action_state())
            .with_metadata("execution_id", json!(report.id.to_string()))
            .with_metadata("duration_ms", json!(report.duration.as_millis() as u64));
        if let Some(code) = report.status.exit_code() {
            result = result.with_metadata("exit_code", json!(code));
        }
        result
    }
}

#[async_trait]
impl Tool for RunCommandTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Run Command")
            .description(
                "Execute a shell command in the workspace. Every command needs explicit \
                 user approval; output is streamed and a report with the exit status is returned.",
            )
            .category("execute")
            .requires_confirmation(true)
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                },
                "cwd": {
                    "type": "string",
                    "description": "Working directory relative to the workspace root"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, input: Value, context: &dyn ToolContext) -> Result<ToolResult> {
        let parsed: RunCommandInput = serde_json::from_value(input)
            .map_err(|e| Error::InvalidInput(format!("Invalid input: {}", e)))?;

        if parsed.command.trim().is_empty() {
            return Err(Error::InvalidInput("Command cannot be empty".to_string()));
        }

        let cwd = match parsed.cwd.as_deref() {
            Some(dir) => context.paths().resolve(dir)?,
            None => context.working_dir().to_path_buf(),
        };

        if let Err(e) = context.gate().authorize_command(&parsed.command).await {
            warn!("run_command not executed: {}", e);
            return Err(e);
        }

        info!("Running approved command: {}", parsed.command);
        let report = context
            .runner()
            .run_cancellable(
                &parsed.command,
                &cwd,
                context.env(),
                context.output_sink(),
                context.cancel_handle(),
            )
            .await;

        Ok(Self::into_result(report))
    }
}
