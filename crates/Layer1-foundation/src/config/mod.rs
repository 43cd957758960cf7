//! Config - 런타임 설정 관리
//!
//! - `runtime.rs` - RuntimeConfig 통합 설정, 병합 전략

mod runtime;

pub use runtime::{MergeStrategy, RuntimeConfig, DEFAULT_EXTENSION_SUFFIX, RUNTIME_CONFIG_FILE};
