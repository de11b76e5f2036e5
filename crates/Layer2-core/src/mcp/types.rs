//! MCP Types - MCP 관련 타입 정의

use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolgate_foundation::ToolSource;

/// MCP 서버에서 제공하는 도구 정보
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpTool {
    /// 도구 이름
    pub name: String,

    /// 도구 설명
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 입력 스키마 (JSON Schema)
    #[serde(rename = "inputSchema", default = "empty_object_schema")]
    pub input_schema: Value,
}

/// 프롬프트 인자
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpPromptArgument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// MCP 서버에서 제공하는 프롬프트 정보
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpPrompt {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<McpPromptArgument>,
}

/// MCP 서버에서 제공하는 리소스 정보
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpResource {
    pub uri: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// MCP 도구 호출
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolCall {
    /// 도구 이름
    pub name: String,

    /// 인자
    #[serde(default)]
    pub arguments: Value,
}

impl McpToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// MCP 도구 실행 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolResult {
    /// 결과 콘텐츠
    #[serde(default)]
    pub content: Vec<McpContent>,

    /// 실패 여부
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

/// 리소스 본문
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceContents {
    pub uri: String,
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// base64 바이너리
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob: Option<String>,
}

/// MCP 콘텐츠
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum McpContent {
    /// 텍스트 콘텐츠
    Text { text: String },

    /// 이미지 콘텐츠
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },

    /// 내장 리소스
    Resource { resource: ResourceContents },

    /// 알 수 없는 콘텐츠 타입
    #[serde(other)]
    Unknown,
}

impl McpContent {
    /// 텍스트 표현
    pub fn to_text(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Image { mime_type, data } => {
                format!("[image {} ({} bytes base64)]", mime_type, data.len())
            }
            Self::Resource { resource } => resource
                .text
                .clone()
                .unwrap_or_else(|| format!("[resource {}]", resource.uri)),
            Self::Unknown => "[unsupported content]".to_string(),
        }
    }
}

impl McpToolResult {
    /// 성공 결과 생성
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            content: vec![McpContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// 오류 결과 생성
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![McpContent::Text { text: text.into() }],
            is_error: true,
        }
    }

    /// 첫 텍스트 콘텐츠
    pub fn text(&self) -> Option<&str> {
        self.content.iter().find_map(|content| match content {
            McpContent::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// 모든 콘텐츠를 줄 단위로 이어 붙인 텍스트
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(McpContent::to_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// 프롬프트 메시지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: McpContent,
}

/// prompts/get 응답
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetPromptResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub messages: Vec<PromptMessage>,
}

/// resources/read 응답
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResourceResult {
    #[serde(default)]
    pub contents: Vec<ResourceContents>,
}

// ============================================================================
// Provider 소속 정보가 붙은 항목 (집계 결과)
// ============================================================================

/// provider 도구 (AI 노출용)
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderTool {
    pub provider: String,
    pub tool: McpTool,
}

impl ProviderTool {
    /// `<provider>__<tool>`
    pub fn exposed_name(&self) -> String {
        ToolSource::provider(&self.provider, &self.tool.name).exposed_name()
    }

    /// 도구 정의 (이름은 네임스페이스 포함)
    pub fn definition(&self) -> Value {
        serde_json::json!({
            "name": self.exposed_name(),
            "description": self.tool.description.clone().unwrap_or_default(),
            "input_schema": self.tool.input_schema,
        })
    }
}

/// provider 프롬프트
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPrompt {
    pub provider: String,
    pub prompt: McpPrompt,
}

/// provider 리소스
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResource {
    pub provider: String,
    pub resource: McpResource,
}

fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mcp_tool_result() {
        let result = McpToolResult::success("Hello");
        assert!(!result.is_error);
        assert_eq!(result.text(), Some("Hello"));

        let error = McpToolResult::error("Failed");
        assert!(error.is_error);
    }

    #[test]
    fn test_is_error_wire_name() {
        let result: McpToolResult = serde_json::from_value(json!({
            "content": [{ "type": "text", "text": "boom" }],
            "isError": true
        }))
        .unwrap();
        assert!(result.is_error);

        let wire = serde_json::to_value(McpToolResult::success("ok")).unwrap();
        assert_eq!(wire["isError"], false);
    }

    #[test]
    fn test_unknown_content_does_not_fail() {
        let result: McpToolResult = serde_json::from_value(json!({
            "content": [
                { "type": "text", "text": "a" },
                { "type": "audio", "data": "..." },
                { "type": "resource", "resource": { "uri": "file:///x", "text": "b" } }
            ]
        }))
        .unwrap();
        assert_eq!(result.joined_text(), "a\n[unsupported content]\nb");
    }

    #[test]
    fn test_tool_without_schema_gets_empty_object() {
        let tool: McpTool = serde_json::from_value(json!({ "name": "ping" })).unwrap();
        assert_eq!(tool.input_schema["type"], "object");

        let exposed = ProviderTool {
            provider: "serverA".into(),
            tool,
        };
        assert_eq!(exposed.exposed_name(), "serverA__ping");
        assert_eq!(exposed.definition()["name"], "serverA__ping");
    }
}
