//! Config - 호스트 설정 관리
//!
//! - `host.rs` - HostConfig (셸, 제한 시간, 출력 크기)

mod host;

pub use host::{HostConfig, CONFIG_FILE, DEFAULT_AGENT_MARKER_ENV};
