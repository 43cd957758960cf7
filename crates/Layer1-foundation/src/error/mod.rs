//! Error types for Prana
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Prana 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련 (훅 실행 전에 감지, 재시도 없음)
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Extension already registered: {0}")]
    DuplicateExtension(String),

    #[error("Extension '{extension}' has missing dependencies: {}", .missing.join(", "))]
    MissingDependencies {
        extension: String,
        missing: Vec<String>,
    },

    #[error("Task '{task}' depends on unknown task '{prerequisite}'")]
    UnresolvedReference { task: String, prerequisite: String },

    #[error("Dependency cycle detected among: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    #[error("Task registered twice: {0}")]
    DuplicateTask(String),

    #[error("Hook '{hook}' of extension '{extension}' is not a {expected} hook")]
    HookModeMismatch {
        extension: String,
        hook: String,
        expected: &'static str,
    },

    // ========================================================================
    // 훅 실행 관련
    // ========================================================================
    #[error("Hook '{hook}' failed in extension '{extension}': {source}")]
    HookFailed {
        extension: String,
        hook: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Extension '{extension}' conflicts on key '{key}' written by a concurrent extension")]
    MergeConflict { extension: String, key: String },

    #[error("Task '{0}' panicked")]
    TaskPanicked(String),

    #[error("Task '{0}' cancelled after an earlier failure")]
    Cancelled(String),

    // ========================================================================
    // 수집 관련
    // ========================================================================
    #[error("Item source '{source_name}' failed for category '{category}': {message}")]
    Source {
        source_name: String,
        category: String,
        message: String,
    },

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 설정 에러인지 확인 (훅이 실행되기 전에 감지되는 종류)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Config(_)
                | Error::DuplicateExtension(_)
                | Error::MissingDependencies { .. }
                | Error::UnresolvedReference { .. }
                | Error::DependencyCycle(_)
                | Error::DuplicateTask(_)
                | Error::HookModeMismatch { .. }
        )
    }

    /// 에러를 발생시킨 확장 ID
    pub fn extension(&self) -> Option<&str> {
        match self {
            Error::MissingDependencies { extension, .. }
            | Error::HookModeMismatch { extension, .. }
            | Error::HookFailed { extension, .. }
            | Error::MergeConflict { extension, .. } => Some(extension),
            Error::TaskPanicked(task) => Some(task),
            _ => None,
        }
    }

    /// 훅 실행 에러 생성 헬퍼
    ///
    /// 같은 확장에서 이미 감싼 에러는 다시 감싸지 않는다.
    pub fn hook_failed(extension: impl Into<String>, hook: impl Into<String>, source: Error) -> Self {
        let extension = extension.into();
        let hook = hook.into();
        if let Error::HookFailed {
            extension: inner_ext,
            hook: inner_hook,
            ..
        } = &source
        {
            if *inner_ext == extension && *inner_hook == hook {
                return source;
            }
        }
        Error::HookFailed {
            extension,
            hook,
            source: Box::new(source),
        }
    }

    /// 수집 소스 에러 생성 헬퍼
    pub fn item_source(
        source_name: impl Into<String>,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Source {
            source_name: source_name.into(),
            category: category.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}
