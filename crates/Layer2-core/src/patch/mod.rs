//! Patch - 승인 기반 파일 변경
//!
//! - `engine`: 유일 구간 치환 / 전체 쓰기 제안, 반영
//! - `review`: 승인 게이트를 통한 diff 리뷰

mod engine;
mod review;

pub use engine::{DiffReviewer, PatchEngine, PatchKind, PatchProposal, ReviewDecision};
pub use review::GateReviewer;
