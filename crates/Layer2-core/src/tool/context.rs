//! Runtime Context - ToolContext 구현
//!
//! 세션 동안 공유되는 부분(게이트, 러너, 패치 엔진)은 `Arc` 로 들고,
//! 호출마다 달라지는 출력 수신자와 취소 핸들은 [`RuntimeContext::for_call`]
//! 로 갈아 끼운다.

use super::security::PathGuard;
use super::traits::ToolContext;
use crate::patch::{DiffReviewer, GateReviewer, PatchEngine};
use crate::process::{CancelHandle, ChunkSink, ProcessRunner};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use toolgate_foundation::{CommandGate, HostConfig};

/// 런타임 컨텍스트
#[derive(Clone)]
pub struct RuntimeContext {
    paths: PathGuard,
    gate: CommandGate,
    runner: Arc<ProcessRunner>,
    patches: PatchEngine,
    reviewer: Arc<dyn DiffReviewer>,
    env: HashMap<String, String>,
    sink: Option<ChunkSink>,
    cancel: CancelHandle,
}

impl RuntimeContext {
    /// 기본 러너와 게이트 기반 리뷰어로 생성
    pub fn new(root: impl Into<PathBuf>, gate: CommandGate) -> Self {
        let paths = PathGuard::new(root);
        Self {
            patches: PatchEngine::new(paths.root().to_path_buf()),
            reviewer: Arc::new(GateReviewer::new(gate.clone())),
            runner: Arc::new(ProcessRunner::new()),
            paths,
            gate,
            env: HashMap::new(),
            sink: None,
            cancel: CancelHandle::new(),
        }
    }

    /// 설정 파일 값으로 러너 구성
    pub fn from_config(root: impl Into<PathBuf>, gate: CommandGate, config: &HostConfig) -> Self {
        Self::new(root, gate).with_runner(ProcessRunner::from_config(config))
    }

    pub fn with_runner(mut self, runner: ProcessRunner) -> Self {
        self.runner = Arc::new(runner);
        self
    }

    pub fn with_reviewer(mut self, reviewer: Arc<dyn DiffReviewer>) -> Self {
        self.reviewer = reviewer;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// 한 번의 호출을 위한 복사본
    pub fn for_call(&self, sink: Option<ChunkSink>, cancel: CancelHandle) -> Self {
        let mut ctx = self.clone();
        ctx.sink = sink;
        ctx.cancel = cancel;
        ctx
    }
}

impl std::fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("root", &self.paths.root())
            .field("runner", &self.runner)
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl ToolContext for RuntimeContext {
    fn working_dir(&self) -> &Path {
        self.paths.root()
    }

    fn paths(&self) -> &PathGuard {
        &self.paths
    }

    fn gate(&self) -> &CommandGate {
        &self.gate
    }

    fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    fn patches(&self) -> &PatchEngine {
        &self.patches
    }

    fn reviewer(&self) -> &dyn DiffReviewer {
        self.reviewer.as_ref()
    }

    fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    fn output_sink(&self) -> Option<ChunkSink> {
        self.sink.clone()
    }

    fn cancel_handle(&self) -> &CancelHandle {
        &self.cancel
    }
}
