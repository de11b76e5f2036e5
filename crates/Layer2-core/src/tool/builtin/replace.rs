//! replace_in_file - 정확한 구간 치환 도구
//!
//! `old_span` 이 파일에 정확히 한 번 있을 때만 제안이 만들어진다.
//! 없거나 여러 번이면 파일을 건드리지 않고 실패한다.

use super::apply_reviewed;
use crate::tool::traits::{Tool, ToolContext};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use toolgate_foundation::{Error, Result, ToolMeta, ToolResult};

/// replace_in_file 입력
#[derive(Debug, Deserialize)]
pub struct ReplaceInput {
    /// 작업 영역 기준 경로
    pub path: String,

    /// 바꿀 구간 (파일에서 유일해야 함)
    pub old_span: String,

    /// 새 구간
    pub new_span: String,
}

/// 구간 치환 도구
#[derive(Debug, Default)]
pub struct ReplaceTool;

impl ReplaceTool {
    pub const NAME: &'static str = "replace_in_file";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for ReplaceTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Replace In File")
            .description(
                "Replace one exact, unique span of text in a workspace file. \
                 Include enough surrounding context for the span to occur exactly once.",
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
                "old_span": {
                    "type": "string",
                    "description": "The exact text to replace (must be unique in the file)"
                },
                "new_span": {
                    "type": "string",
                    "description": "The replacement text"
                }
            },
            "required": ["path", "old_span", "new_span"]
        })
    }

    async fn execute(&self, input: Value, context: &dyn ToolContext) -> Result<ToolResult> {
        let parsed: ReplaceInput = serde_json::from_value(input)
            .map_err(|e| Error::InvalidInput(format!("Invalid input: {}", e)))?;

        let proposal = context
            .patches()
            .propose_replace(&parsed.path, &parsed.old_span, &parsed.new_span)
            .await?;

        apply_reviewed(context, proposal, "Edited").await
    }
}
