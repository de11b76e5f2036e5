//! Storage module for toolgate
//!
//! - `json`: JSON - 설정 파일 저장/로드 (전역 + 프로젝트)

mod json;

pub use json::{JsonStore, PROJECT_DIR};
