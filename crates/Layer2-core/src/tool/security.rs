//! Tool Security - 작업 영역 경로 제한
//!
//! 모든 파일 읽기/쓰기와 명령 실행 위치는 [`resolve_safe`] 를 거친다.
//!
//! - `.`/`..` 을 파일 시스템 접근 없이 정규화
//! - 결과가 루트 자체이거나 루트의 하위 경로여야 통과 (경로 단위 비교)
//! - 파일 시스템 루트 위로 올라가는 `..` 은 잘라내지 않고 거절
//! - 루트가 절대 경로가 아니면 모든 경로를 거절

use std::path::{Component, Path, PathBuf};
use toolgate_foundation::{Error, Result};

/// 작업 영역 루트에 묶인 경로 해석기
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = normalize_path(&root).unwrap_or(root);
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 작업 영역 안의 절대 경로로 해석
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        resolve_safe(&self.root, path)
    }

    /// 작업 영역 기준 상대 경로 (표시용)
    pub fn display_path(&self, absolute: &Path) -> String {
        absolute
            .strip_prefix(&self.root)
            .unwrap_or(absolute)
            .display()
            .to_string()
    }
}

/// 경로 해석 및 검증
///
/// 순수 함수다. 파일 시스템에 접근하지 않는다.
pub fn resolve_safe(root: &Path, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    // 상대 루트는 `..` 접두어끼리 비교되어 경계가 무너진다
    if !root.is_absolute() {
        return Err(Error::SecurityRejected(format!(
            "Workspace root '{}' is not an absolute path",
            root.display()
        )));
    }
    let out_of_bounds = || {
        Error::SecurityRejected(format!(
            "Path '{}' is outside the workspace '{}'",
            path.display(),
            root.display()
        ))
    };

    let root = normalize_path(root).ok_or_else(out_of_bounds)?;
    let resolved = normalize_path(&root.join(path)).ok_or_else(out_of_bounds)?;

    // Path::starts_with 는 경로 단위로 비교한다 (/work/app 은 /work/app2 를 포함하지 않음)
    if resolved.starts_with(&root) {
        Ok(resolved)
    } else {
        Err(out_of_bounds())
    }
}

/// 경로 정규화 (canonicalize 없이)
///
/// 루트 위로 올라가는 `..` 이 있으면 `None`.
fn normalize_path(path: &Path) -> Option<PathBuf> {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::ParentDir) => components.push(component),
                // 루트/드라이브 위로는 올라갈 수 없다
                Some(Component::RootDir) | Some(Component::Prefix(_)) => return None,
                Some(Component::CurDir) => components.push(component),
                None => components.push(component),
            },
            Component::CurDir => {}
            _ => components.push(component),
        }
    }

    Some(components.iter().collect())
}
