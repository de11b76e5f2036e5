//! Tool Registry - 내장 도구 등록 및 실행
//!
//! 실행 전에 인자를 도구 스키마로 검증하고, 도구가 돌려준 에러는
//! 모두 [`ToolResult`] 값으로 바꿔서 돌려준다.

use super::builtin;
use super::schema::validate_arguments;
use super::traits::{Tool, ToolContext};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use toolgate_foundation::{Error, ToolResult};
use tracing::{debug, warn};

/// 도구 레지스트리
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// 빈 레지스트리 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// Builtin 도구들을 포함한 레지스트리 생성
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for tool in builtin::all_tools() {
            registry.register(tool);
        }
        registry
    }

    /// 도구 등록
    ///
    /// 이름에 `__` 가 들어간 도구는 provider 도구와 구분할 수 없어 받지 않는다.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> bool {
        let name = tool.name().to_string();
        if name.is_empty() || name.contains(toolgate_foundation::NAMESPACE_SEPARATOR) {
            warn!("Refusing to register tool with reserved name '{}'", name);
            return false;
        }
        self.tools.insert(name, tool);
        true
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// 정렬된 도구 이름
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// AI에게 넘길 도구 정의 (`name`, `description`, `input_schema`)
    pub fn definitions(&self) -> Vec<Value> {
        let mut tools: Vec<&Arc<dyn Tool>> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
            .into_iter()
            .map(|tool| {
                let meta = tool.meta();
                json!({
                    "name": meta.name,
                    "description": meta.description,
                    "input_schema": tool.schema(),
                })
            })
            .collect()
    }

    /// 도구 실행
    pub async fn execute(&self, name: &str, args: Value, ctx: &dyn ToolContext) -> ToolResult {
        let start = Instant::now();

        let Some(tool) = self.get(name) else {
            return ToolResult::from_error(&Error::NotFound(format!("Tool not found: {}", name)));
        };

        if let Err(e) = validate_arguments(&tool.schema(), &args) {
            debug!("Tool '{}' rejected arguments: {}", name, e);
            return ToolResult::from_error(&e);
        }

        let result = match tool.execute(args, ctx).await {
            Ok(result) => result,
            Err(e) => ToolResult::from_error(&e),
        };

        debug!(
            "Tool '{}' finished in {}ms, success: {}, state: {:?}",
            name,
            start.elapsed().as_millis(),
            result.success,
            result.state
        );

        result
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::builtin::test_support::{context, Prompts};
    use toolgate_foundation::ActionState;

    #[test]
    fn test_builtins_registered() {
        let registry = ToolRegistry::with_builtins();
        assert_eq!(
            registry.names(),
            vec!["read_file", "replace_in_file", "run_command", "write_to_file"]
        );

        let definitions = registry.definitions();
        assert_eq!(definitions.len(), 4);
        assert!(definitions.iter().all(|d| d["input_schema"]["type"] == "object"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let dir = tempfile::tempdir().unwrap();
        let prompts = Prompts::approving();
        let ctx = context(dir.path(), &prompts);

        let result = ToolRegistry::with_builtins()
            .execute("delete_everything", json!({}), &ctx)
            .await;
        assert!(!result.success);
        assert!(result.to_text().starts_with("[ERROR]"));
    }

    #[tokio::test]
    async fn test_arguments_validated_before_execution() {
        let dir = tempfile::tempdir().unwrap();
        let prompts = Prompts::approving();
        let ctx = context(dir.path(), &prompts);

        let result = ToolRegistry::with_builtins()
            .execute("run_command", json!({ "command": 42 }), &ctx)
            .await;

        assert!(!result.success);
        assert_eq!(result.state, ActionState::Errored);
        assert!(result.to_text().contains("must be string"));
        assert_eq!(prompts.count(), 0);
    }

    #[tokio::test]
    async fn test_denial_becomes_result() {
        let dir = tempfile::tempdir().unwrap();
        let prompts = Prompts::denying();
        let ctx = context(dir.path(), &prompts);

        let result = ToolRegistry::with_builtins()
            .execute("run_command", json!({ "command": "echo hi" }), &ctx)
            .await;

        assert!(!result.success);
        assert_eq!(result.state, ActionState::Denied);
    }
}
