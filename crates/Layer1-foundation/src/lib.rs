//! # prana-foundation
//!
//! Foundation layer for Prana:
//! - Error: 중앙 에러 타입 (설정 / 훅 실행 / 수집 에러 분류)
//! - Config: 런타임 설정 (공통 의존성, 병합 전략, 동시성 제한, 검색 경로)
//! - Storage: JsonStore (글로벌/프로젝트 설정), JSONC 파싱
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  prana-cli (Layer3)                                     │
//! │                     │                                   │
//! │                     ▼                                   │
//! │  prana-core (Layer2)                                    │
//! │  Runtime ─ ExtensionRegistry ─ HookInvoker ─ DagExecutor│
//! │        └─ CollectionCache ─ ItemSource                  │
//! │                     │                                   │
//! │                     ▼                                   │
//! │  prana-foundation (Layer1)                              │
//! │  Error / RuntimeConfig / JsonStore                      │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{MergeStrategy, RuntimeConfig, DEFAULT_EXTENSION_SUFFIX, RUNTIME_CONFIG_FILE};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::{parse_jsonc, strip_json_comments, JsonStore, PROJECT_DIR};
