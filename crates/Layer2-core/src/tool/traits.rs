//! Tool / ToolContext - 내장 도구 인터페이스

use crate::patch::{DiffReviewer, PatchEngine};
use crate::process::{CancelHandle, ChunkSink, ProcessRunner};
use crate::tool::security::PathGuard;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use toolgate_foundation::{CommandGate, Result, ToolMeta, ToolResult};

/// 내장 도구
///
/// `execute` 의 `Err` 는 호출 단위 실패(입력 오류, 거부, 경계 위반)이고,
/// 도구가 정상적으로 끝났지만 실패한 결과는 `Ok(ToolResult::error(..))` 로 돌려준다.
#[async_trait]
pub trait Tool: Send + Sync {
    /// 도구 이름 (고유 식별자)
    fn name(&self) -> &str;

    /// 도구 메타데이터
    fn meta(&self) -> ToolMeta;

    /// 입력 JSON 스키마
    fn schema(&self) -> Value;

    /// 도구 실행
    ///
    /// 인자는 호출 전에 [`schema`](Tool::schema) 로 검증되어 있다.
    async fn execute(&self, input: Value, context: &dyn ToolContext) -> Result<ToolResult>;
}

/// 도구 실행 환경
pub trait ToolContext: Send + Sync {
    /// 작업 영역 루트
    fn working_dir(&self) -> &Path;

    /// 경로 경계
    fn paths(&self) -> &PathGuard;

    /// 승인 게이트
    fn gate(&self) -> &CommandGate;

    fn runner(&self) -> &ProcessRunner;

    fn patches(&self) -> &PatchEngine;

    /// 파일 변경 리뷰어
    fn reviewer(&self) -> &dyn DiffReviewer;

    /// 실행 명령에 추가되는 환경 변수
    fn env(&self) -> &HashMap<String, String>;

    /// 출력 청크 수신자 (없으면 보고서만 남는다)
    fn output_sink(&self) -> Option<ChunkSink>;

    /// 현재 호출의 취소 핸들
    fn cancel_handle(&self) -> &CancelHandle;
}
