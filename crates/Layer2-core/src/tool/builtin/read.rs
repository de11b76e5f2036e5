//! read_file - 파일 읽기 도구
//!
//! 줄 번호 포함 (cat -n 스타일), offset/limit 지원.
//! 읽기는 승인이 필요 없지만 작업 영역 경계는 그대로 적용된다.

use crate::tool::traits::{Tool, ToolContext};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use toolgate_foundation::{Error, Result, ToolMeta, ToolResult};

/// read_file 입력
#[derive(Debug, Deserialize)]
pub struct ReadInput {
    /// 작업 영역 기준 경로
    pub path: String,

    /// 시작 줄 번호 (1-based)
    #[serde(default)]
    pub offset: Option<usize>,

    /// 최대 줄 수 (기본: 2000)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// 파일 읽기 도구
#[derive(Debug, Default)]
pub struct ReadTool;

impl ReadTool {
    pub const NAME: &'static str = "read_file";

    const DEFAULT_LIMIT: usize = 2000;

    /// 이 이상은 잘림
    const MAX_LINE_LENGTH: usize = 2000;

    pub fn new() -> Self {
        Self
    }

    fn number_lines(content: &str, offset: usize, limit: usize) -> String {
        let start = offset.max(1);
        let mut output = String::new();

        for (idx, line) in content.lines().enumerate().skip(start - 1).take(limit) {
            let line = if line.len() > Self::MAX_LINE_LENGTH {
                let mut end = Self::MAX_LINE_LENGTH;
                while !line.is_char_boundary(end) {
                    end -= 1;
                }
                format!("{}... [truncated]", &line[..end])
            } else {
                line.to_string()
            };
            output.push_str(&format!("{:>6}\t{}\n", idx + 1, line));
        }

        output
    }
}

#[async_trait]
impl Tool for ReadTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Read File")
            .description("Read a workspace file with line numbers")
            .category("filesystem")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path relative to the workspace root"
                },
                "offset": {
                    "type": "integer",
                    "description": "Start line number (1-based)"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum lines to read (default: 2000)"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value, context: &dyn ToolContext) -> Result<ToolResult> {
        let parsed: ReadInput = serde_json::from_value(input)
            .map_err(|e| Error::InvalidInput(format!("Invalid input: {}", e)))?;

        let path = context.paths().resolve(&parsed.path)?;

        if path.is_dir() {
            return Ok(ToolResult::error(format!(
                "Cannot read directory: {}",
                parsed.path
            )));
        }

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("File not found: {}", parsed.path)));
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => {
                return Ok(ToolResult::success(format!(
                    "[Binary file: {} ({} bytes)]",
                    parsed.path,
                    e.as_bytes().len()
                )));
            }
        };

        if content.is_empty() {
            return Ok(ToolResult::success("[Empty file]"));
        }

        let offset = parsed.offset.unwrap_or(1);
        let limit = parsed.limit.unwrap_or(Self::DEFAULT_LIMIT);
        let numbered = Self::number_lines(&content, offset, limit);

        Ok(ToolResult::success(numbered)
            .with_metadata("total_lines", json!(content.lines().count())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::builtin::test_support::{context, Prompts};

    #[tokio::test]
    async fn test_read_with_line_numbers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "one\ntwo\nthree\n").unwrap();
        let prompts = Prompts::denying();
        let ctx = context(dir.path(), &prompts);

        let result = ReadTool::new()
            .execute(json!({ "path": "a.txt", "offset": 2, "limit": 1 }), &ctx)
            .await
            .unwrap();

        assert_eq!(result.output, "     2\ttwo\n");
        assert_eq!(prompts.count(), 0);
    }

    #[tokio::test]
    async fn test_read_outside_workspace_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let prompts = Prompts::approving();
        let ctx = context(dir.path(), &prompts);

        let err = ReadTool::new()
            .execute(json!({ "path": "../../etc/passwd" }), &ctx)
            .await
            .unwrap_err();
        assert!(err.is_security());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let prompts = Prompts::approving();
        let ctx = context(dir.path(), &prompts);

        let err = ReadTool::new()
            .execute(json!({ "path": "nope.txt" }), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
