//! write_to_file - 파일 쓰기 도구
//!
//! 전체 쓰기 제안 → diff 리뷰 → 승인 시 반영.

use super::apply_reviewed;
use crate::tool::traits::{Tool, ToolContext};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use toolgate_foundation::{Error, Result, ToolMeta, ToolResult};

/// write_to_file 입력
#[derive(Debug, Deserialize)]
pub struct WriteInput {
    /// 작업 영역 기준 경로
    pub path: String,

    /// 파일 전체 내용
    pub content: String,
}

/// 파일 쓰기 도구
#[derive(Debug, Default)]
pub struct WriteTool;

impl WriteTool {
    pub const NAME: &'static str = "write_to_file";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for WriteTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Write File")
            .description(
                "Create or overwrite a workspace file. The change is shown as a diff \
                 and only written after the user approves it.",
            )
            .category("filesystem")
            .requires_confirmation(true)
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path relative to the workspace root"
                },
                "content": {
                    "type": "string",
                    "description": "The complete file content"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, input: Value, context: &dyn ToolContext) -> Result<ToolResult> {
        let parsed: WriteInput = serde_json::from_value(input)
            .map_err(|e| Error::InvalidInput(format!("Invalid input: {}", e)))?;

        let proposal = context
            .patches()
            .propose_write(&parsed.path, &parsed.content)
            .await?;

        if proposal.original_content.as_deref() == Some(parsed.content.as_str()) {
            return Ok(ToolResult::success(format!(
                "{} already has this content",
                proposal.display_path
            )));
        }

        let verb = if proposal.is_new_file() { "Created" } else { "Wrote" };
        apply_reviewed(context, proposal, verb).await
    }
}
