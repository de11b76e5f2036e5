//! Builtin Tools - 내장 도구들
//!
//! ### 파일시스템
//! - `read_file` - 파일 읽기 (줄 번호 포함)
//! - `write_to_file` - 파일 쓰기 (diff 리뷰 후 반영)
//! - `replace_in_file` - 유일 구간 치환 (diff 리뷰 후 반영)
//!
//! ### 실행
//! - `run_command` - Shell 명령 실행 (승인 필수)

pub mod read;
pub mod replace;
pub mod run_command;
pub mod write;

pub use read::ReadTool;
pub use replace::ReplaceTool;
pub use run_command::RunCommandTool;
pub use write::WriteTool;

use crate::patch::{PatchProposal, ReviewDecision};
use crate::tool::traits::{Tool, ToolContext};
use serde_json::json;
use std::sync::Arc;
use toolgate_foundation::{Error, Result, ToolResult};
use tracing::warn;

/// 모든 builtin 도구 인스턴스 생성
pub fn all_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(RunCommandTool::new()) as Arc<dyn Tool>,
        Arc::new(ReadTool::new()),
        Arc::new(WriteTool::new()),
        Arc::new(ReplaceTool::new()),
    ]
}

/// 리뷰어 승인 후 제안 반영
async fn apply_reviewed(
    context: &dyn ToolContext,
    proposal: PatchProposal,
    verb: &str,
) -> Result<ToolResult> {
    match context.reviewer().review(&proposal).await {
        ReviewDecision::Accept => {}
        ReviewDecision::Reject => {
            warn!("Change to {} rejected by reviewer", proposal.display_path);
            return Err(Error::UserDenied(format!(
                "change to {}",
                proposal.display_path
            )));
        }
    }

    context.patches().apply(&proposal).await?;

    Ok(ToolResult::success(format!(
        "{} {} ({} bytes)",
        verb,
        proposal.display_path,
        proposal.new_content.len()
    ))
    .with_metadata("proposal_id", json!(proposal.id.to_string()))
    .with_metadata("diff", json!(proposal.diff())))
}
