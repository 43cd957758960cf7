//! Runtime Config - 런타임 통합 설정
//!
//! 글로벌(`<config_dir>/prana/runtime.json`)과 프로젝트(`.prana/runtime.json`)
//! 설정을 병합해서 사용한다. 프로젝트 설정이 우선한다.

use crate::storage::JsonStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 설정 파일명
pub const RUNTIME_CONFIG_FILE: &str = "runtime.json";

/// 확장 선언 파일 기본 접미사
pub const DEFAULT_EXTENSION_SUFFIX: &str = ".extension.json";

// ============================================================================
// MergeStrategy
// ============================================================================

/// 훅 기여를 공유 결과에 병합하는 방식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// 나중에 병합된 기여가 같은 키를 덮어쓴다
    #[default]
    Overwrite,

    /// 동시에 실행된 다른 확장이 먼저 쓴 키를 건드리면 실패
    RejectOnConflict,
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overwrite => write!(f, "overwrite"),
            Self::RejectOnConflict => write!(f, "reject_on_conflict"),
        }
    }
}

// ============================================================================
// RuntimeConfig
// ============================================================================

/// Prana 런타임 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// 모든 확장이 암묵적으로 의존하는 확장 목록
    #[serde(default)]
    pub common_dependencies: Vec<String>,

    /// 병합 전략
    #[serde(default)]
    pub merge_strategy: MergeStrategy,

    /// 동시에 실행할 최대 훅 수 (None이면 제한 없음)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,

    /// 확장 선언 파일 접미사
    #[serde(default = "default_extension_suffix")]
    pub extension_suffix: String,

    /// 확장 검색 경로
    #[serde(default)]
    pub extension_paths: Vec<PathBuf>,

    /// 정적 아이템 검색 경로
    #[serde(default)]
    pub item_paths: Vec<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            common_dependencies: Vec::new(),
            merge_strategy: MergeStrategy::default(),
            max_concurrency: None,
            extension_suffix: default_extension_suffix(),
            extension_paths: Vec::new(),
            item_paths: Vec::new(),
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드
    pub fn load() -> Result<Self> {
        let mut config = Self::new();

        // 1. 글로벌 설정
        if let Ok(global) = JsonStore::global() {
            if let Some(global_config) = global.load_optional::<RuntimeConfig>(RUNTIME_CONFIG_FILE)? {
                debug!("Loaded global runtime config from {:?}", global.base_dir());
                config.merge(global_config);
            }
        }

        // 2. 프로젝트 설정
        if let Ok(project) = JsonStore::current_project() {
            if let Some(project_config) =
                project.load_optional::<RuntimeConfig>(RUNTIME_CONFIG_FILE)?
            {
                debug!("Loaded project runtime config from {:?}", project.base_dir());
                config.merge(project_config);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// 지정한 파일 하나만 로드
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Config(format!("Invalid config path: {}", path.display())))?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        let config: RuntimeConfig = JsonStore::new(dir).load(filename)?;
        config.validate()?;
        Ok(config)
    }

    // ========================================================================
    // Merge / Validate
    // ========================================================================

    /// 다른 설정과 병합 (other가 우선)
    pub fn merge(&mut self, other: RuntimeConfig) {
        for dep in other.common_dependencies {
            if !self.common_dependencies.contains(&dep) {
                self.common_dependencies.push(dep);
            }
        }
        if other.merge_strategy != MergeStrategy::default() {
            self.merge_strategy = other.merge_strategy;
        }
        if other.max_concurrency.is_some() {
            self.max_concurrency = other.max_concurrency;
        }
        if other.extension_suffix != default_extension_suffix() {
            self.extension_suffix = other.extension_suffix;
        }
        self.extension_paths.extend(other.extension_paths);
        self.item_paths.extend(other.item_paths);
    }

    /// 설정 값 검증
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == Some(0) {
            return Err(Error::Config("maxConcurrency must be at least 1".to_string()));
        }
        if self.extension_suffix.is_empty() {
            return Err(Error::Config("extensionSuffix must not be empty".to_string()));
        }
        Ok(())
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn common_dependency(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        if !self.common_dependencies.contains(&id) {
            self.common_dependencies.push(id);
        }
        self
    }

    pub fn merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge_strategy = strategy;
        self
    }

    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }

    pub fn extension_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.extension_paths.push(path.into());
        self
    }

    pub fn item_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.item_paths.push(path.into());
        self
    }
}

fn default_extension_suffix() -> String {
    DEFAULT_EXTENSION_SUFFIX.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.merge_strategy, MergeStrategy::Overwrite);
        assert_eq!(config.extension_suffix, ".extension.json");
        assert!(config.max_concurrency.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_project_overrides_global() {
        let mut global = RuntimeConfig::new()
            .common_dependency("core")
            .item_path("/global/items");
        let project = RuntimeConfig::new()
            .common_dependency("core")
            .common_dependency("theme")
            .merge_strategy(MergeStrategy::RejectOnConflict)
            .max_concurrency(2);

        global.merge(project);

        assert_eq!(global.common_dependencies, vec!["core", "theme"]);
        assert_eq!(global.merge_strategy, MergeStrategy::RejectOnConflict);
        assert_eq!(global.max_concurrency, Some(2));
        assert_eq!(global.item_paths.len(), 1);
    }

    #[test]
    fn test_load_file_with_comments() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("runtime.json");
        std::fs::write(
            &path,
            r#"{
                // shared by every extension
                "commonDependencies": ["core"],
                "mergeStrategy": "reject_on_conflict",
                "maxConcurrency": 8
            }"#,
        )
        .unwrap();

        let config = RuntimeConfig::load_file(&path).unwrap();
        assert_eq!(config.common_dependencies, vec!["core"]);
        assert_eq!(config.merge_strategy, MergeStrategy::RejectOnConflict);
        assert_eq!(config.max_concurrency, Some(8));
        assert_eq!(config.extension_suffix, DEFAULT_EXTENSION_SUFFIX);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = RuntimeConfig::new().max_concurrency(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
