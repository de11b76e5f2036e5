//! Patch engine - 정확한 위치 치환 제안
//!
//! 제안 단계에서는 파일을 절대 쓰지 않는다. 리뷰어가 승인한 뒤
//! [`PatchEngine::apply`] 로만 반영되며, 그 사이 파일이 바뀌었으면 거절한다.

use crate::tool::security::PathGuard;
use chrono::{DateTime, Utc};
use similar::TextDiff;
use std::path::{Path, PathBuf};
use toolgate_foundation::{Error, Result};
use tracing::{debug, info};
use uuid::Uuid;

/// 제안 종류
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchKind {
    /// 유일한 구간 하나를 치환
    Replace {
        /// 원본에서 `old_span` 의 바이트 위치
        offset: usize,
        old_span: String,
        new_span: String,
    },
    /// 파일 전체 쓰기 (새 파일 포함)
    Write,
}

/// 아직 반영되지 않은 변경
#[derive(Debug, Clone)]
pub struct PatchProposal {
    pub id: Uuid,
    /// 작업 영역 안의 절대 경로
    pub path: PathBuf,
    /// 표시용 상대 경로
    pub display_path: String,
    pub kind: PatchKind,
    /// 제안 시점의 내용 (`None` 이면 파일이 없었음)
    pub original_content: Option<String>,
    pub new_content: String,
    pub created_at: DateTime<Utc>,
}

impl PatchProposal {
    /// unified diff (리뷰어 표시용)
    pub fn diff(&self) -> String {
        let old = self.original_content.as_deref().unwrap_or("");
        TextDiff::from_lines(old, &self.new_content)
            .unified_diff()
            .context_radius(3)
            .header(
                &format!("a/{}", self.display_path),
                &format!("b/{}", self.display_path),
            )
            .to_string()
    }

    pub fn is_new_file(&self) -> bool {
        self.original_content.is_none()
    }
}

/// 리뷰 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Accept,
    Reject,
}

/// 변경 제안을 사람에게 보여주고 결정을 받는 쪽
#[async_trait::async_trait]
pub trait DiffReviewer: Send + Sync {
    async fn review(&self, proposal: &PatchProposal) -> ReviewDecision;
}

/// 치환/쓰기 제안 생성기
#[derive(Debug, Clone)]
pub struct PatchEngine {
    guard: PathGuard,
}

impl PatchEngine {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            guard: PathGuard::new(root),
        }
    }

    pub fn root(&self) -> &Path {
        self.guard.root()
    }

    /// 유일한 `old_span` 을 `new_span` 으로 바꾼 제안
    ///
    /// - 없음 → `NotFound`
    /// - 두 번 이상 → `Ambiguous` (여러 곳을 조용히 고치지 않는다)
    pub async fn propose_replace(
        &self,
        path: &str,
        old_span: &str,
        new_span: &str,
    ) -> Result<PatchProposal> {
        if old_span.is_empty() {
            return Err(Error::InvalidInput("old_span cannot be empty".to_string()));
        }
        if old_span == new_span {
            return Err(Error::InvalidInput(
                "old_span and new_span must be different".to_string(),
            ));
        }

        let absolute = self.guard.resolve(path)?;
        let content = read_existing(&absolute, path).await?;

        let first = content.find(old_span);
        let last = content.rfind(old_span);
        let offset = match (first, last) {
            (None, _) | (_, None) => {
                return Err(Error::NotFound(format!("span not found in {}", path)));
            }
            (Some(first), Some(last)) if first != last => {
                let count = content.matches(old_span).count().max(2);
                return Err(Error::Ambiguous(format!(
                    "span occurs {} times in {}; include more context",
                    count, path
                )));
            }
            (Some(offset), Some(_)) => offset,
        };

        let mut new_content = String::with_capacity(content.len() + new_span.len());
        new_content.push_str(&content[..offset]);
        new_content.push_str(new_span);
        new_content.push_str(&content[offset + old_span.len()..]);

        debug!("Proposed replace in {} at byte {}", path, offset);

        Ok(PatchProposal {
            id: Uuid::new_v4(),
            display_path: self.guard.display_path(&absolute),
            path: absolute,
            kind: PatchKind::Replace {
                offset,
                old_span: old_span.to_string(),
                new_span: new_span.to_string(),
            },
            original_content: Some(content),
            new_content,
            created_at: Utc::now(),
        })
    }

    /// 파일 전체 쓰기 제안
    pub async fn propose_write(&self, path: &str, content: &str) -> Result<PatchProposal> {
        let absolute = self.guard.resolve(path)?;
        if absolute.is_dir() {
            return Err(Error::InvalidInput(format!(
                "Cannot write to directory: {}",
                path
            )));
        }

        let original_content = match tokio::fs::read_to_string(&absolute).await {
            Ok(existing) => Some(existing),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(Error::Io(e)),
        };

        Ok(PatchProposal {
            id: Uuid::new_v4(),
            display_path: self.guard.display_path(&absolute),
            path: absolute,
            kind: PatchKind::Write,
            original_content,
            new_content: content.to_string(),
            created_at: Utc::now(),
        })
    }

    /// 승인된 제안 반영
    ///
    /// 제안 이후 파일이 바뀌었으면 `Conflict`.
    pub async fn apply(&self, proposal: &PatchProposal) -> Result<()> {
        // 제안이 다른 루트에서 만들어졌을 수도 있다
        let absolute = self.guard.resolve(&proposal.path)?;

        let current = match tokio::fs::read_to_string(&absolute).await {
            Ok(existing) => Some(existing),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(Error::Io(e)),
        };
        if current != proposal.original_content {
            return Err(Error::Conflict(format!(
                "{} changed since the proposal was made",
                proposal.display_path
            )));
        }

        if let Some(parent) = absolute.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&absolute, &proposal.new_content).await?;

        info!(
            "Applied proposal {} to {} ({} bytes)",
            proposal.id,
            proposal.display_path,
            proposal.new_content.len()
        );
        Ok(())
    }
}

async fn read_existing(absolute: &Path, display: &str) -> Result<String> {
    match tokio::fs::read_to_string(absolute).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::NotFound(format!("File not found: {}", display)))
        }
        Err(e) => Err(Error::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn workspace(file: &str, content: &str) -> (tempfile::TempDir, PatchEngine) {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(file), content).await.unwrap();
        let engine = PatchEngine::new(dir.path());
        (dir, engine)
    }

    #[tokio::test]
    async fn test_unique_span_is_spliced() {
        let (dir, engine) = workspace("a.txt", "prefix OLD suffix").await;

        let proposal = engine.propose_replace("a.txt", "OLD", "NEW").await.unwrap();

        assert_eq!(proposal.new_content, "prefix NEW suffix");
        assert!(matches!(proposal.kind, PatchKind::Replace { offset: 7, .. }));
        // 제안만으로는 파일이 바뀌지 않는다
        let on_disk = std::fs::read_to_string(dir.path().join("a.txt")).unwrap();
        assert_eq!(on_disk, "prefix OLD suffix");
    }

    #[tokio::test]
    async fn test_span_twice_is_ambiguous() {
        let (dir, engine) = workspace("a.txt", "x = 1;\nx = 1;\n").await;

        let err = engine.propose_replace("a.txt", "x = 1;", "x = 2;").await.unwrap_err();

        assert!(matches!(err, Error::Ambiguous(_)));
        let on_disk = std::fs::read_to_string(dir.path().join("a.txt")).unwrap();
        assert_eq!(on_disk, "x = 1;\nx = 1;\n");
    }

    #[tokio::test]
    async fn test_overlapping_span_is_ambiguous() {
        let (_dir, engine) = workspace("a.txt", "aaa").await;
        let err = engine.propose_replace("a.txt", "aa", "b").await.unwrap_err();
        assert!(matches!(err, Error::Ambiguous(_)));
    }

    #[tokio::test]
    async fn test_missing_span_and_file() {
        let (_dir, engine) = workspace("a.txt", "hello").await;

        let err = engine.propose_replace("a.txt", "bye", "x").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let err = engine.propose_replace("nope.txt", "a", "b").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_out_of_workspace_is_rejected() {
        let (_dir, engine) = workspace("a.txt", "hello").await;
        let err = engine.propose_replace("../a.txt", "hello", "x").await.unwrap_err();
        assert!(err.is_security());
    }

    #[tokio::test]
    async fn test_apply_writes_and_detects_staleness() {
        let (dir, engine) = workspace("a.txt", "one two").await;
        let proposal = engine.propose_replace("a.txt", "two", "three").await.unwrap();

        std::fs::write(dir.path().join("a.txt"), "one two (edited)").unwrap();
        let err = engine.apply(&proposal).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let fresh = engine.propose_replace("a.txt", "two", "three").await.unwrap();
        engine.apply(&fresh).await.unwrap();
        let on_disk = std::fs::read_to_string(dir.path().join("a.txt")).unwrap();
        assert_eq!(on_disk, "one three (edited)");
    }

    #[tokio::test]
    async fn test_write_new_file_with_diff() {
        let dir = tempfile::tempdir().unwrap();
        let engine = PatchEngine::new(dir.path());

        let proposal = engine
            .propose_write("src/new.rs", "fn main() {}\n")
            .await
            .unwrap();
        assert!(proposal.is_new_file());
        assert!(proposal.diff().contains("+fn main() {}"));
        assert!(proposal.diff().contains("b/src/new.rs"));

        engine.apply(&proposal).await.unwrap();
        let on_disk = std::fs::read_to_string(dir.path().join("src/new.rs")).unwrap();
        assert_eq!(on_disk, "fn main() {}\n");
    }
}
