//! Extension Discovery - 디스크에서 확장 선언 파일 발견
//!
//! 검색 경로 아래를 재귀적으로 돌면서 `<name>.extension.json` 파일을 읽는다.
//! 선언 파일은 주석(JSONC)을 허용한다.

use super::manifest::ExtensionManifest;
use crate::scan::{find_files_with_suffix, stem_without_suffix};
use prana_foundation::{parse_jsonc, Error, Result, DEFAULT_EXTENSION_SUFFIX};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

// ============================================================================
// DiscoveredExtension
// ============================================================================

/// 발견된 확장
#[derive(Debug, Clone)]
pub struct DiscoveredExtension {
    pub manifest: ExtensionManifest,

    /// 선언 파일 경로
    pub file: PathBuf,
}

// ============================================================================
// ExtensionDiscovery
// ============================================================================

/// 확장 발견 시스템
#[derive(Debug, Clone)]
pub struct ExtensionDiscovery {
    search_paths: Vec<PathBuf>,
    suffix: String,
}

impl Default for ExtensionDiscovery {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSION_SUFFIX)
    }
}

impl ExtensionDiscovery {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            search_paths: Vec::new(),
            suffix: suffix.into(),
        }
    }

    /// 검색 경로 추가
    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.search_paths.push(path.into());
    }

    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.add_search_path(path);
        self
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// 모든 확장 발견 (파일 경로 순)
    ///
    /// 읽기나 파싱에 실패한 파일이 있으면 에러를 그대로 반환한다.
    pub async fn discover(&self) -> Result<Vec<DiscoveredExtension>> {
        let files = find_files_with_suffix(&self.search_paths, &self.suffix).await?;
        let mut found = Vec::with_capacity(files.len());

        for file in files {
            let manifest = self.parse_extension_file(&file).await?;
            debug!("Discovered extension {} at {:?}", manifest.id, file);
            found.push(DiscoveredExtension { manifest, file });
        }

        info!(
            "Discovered {} extensions in {} search paths",
            found.len(),
            self.search_paths.len()
        );
        Ok(found)
    }

    async fn parse_extension_file(&self, path: &Path) -> Result<ExtensionManifest> {
        let content = fs::read_to_string(path).await?;
        let file: ExtensionJsonFile = parse_jsonc(&content)
            .map_err(|e| Error::Config(format!("Invalid extension file {}: {}", path.display(), e)))?;

        let id = match file.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => stem_without_suffix(path, &self.suffix).ok_or_else(|| {
                Error::Config(format!("Cannot derive extension name from {}", path.display()))
            })?,
        };

        let mut settings = file.extra;
        settings.extend(file.settings);

        Ok(ExtensionManifest {
            id,
            title: file.title,
            description: file.description,
            dependencies: file.dependencies,
            settings,
            path: path.parent().map(Path::to_path_buf),
        })
    }
}

// ============================================================================
// ExtensionJsonFile - *.extension.json 파일 구조
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtensionJsonFile {
    /// 확장 이름 (없으면 파일 이름에서 접미사를 뗀 값)
    #[serde(default, alias = "id")]
    name: Option<String>,

    #[serde(default)]
    title: Option<String>,

    #[serde(default)]
    description: Option<String>,

    #[serde(default)]
    dependencies: Vec<String>,

    #[serde(default)]
    settings: Map<String, Value>,

    /// 나머지 필드 (settings에 합쳐짐)
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_discover_nested_files() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("addon");
        std::fs::create_dir_all(&nested).unwrap();

        std::fs::write(
            temp.path().join("base.extension.json"),
            r#"{ "title": "Base", "color": "blue", "settings": { "size": 3 } }"#,
        )
        .unwrap();
        std::fs::write(
            nested.join("whatever.extension.json"),
            r#"{
                // explicit name wins over the file name
                "name": "addon",
                "dependencies": ["base"]
            }"#,
        )
        .unwrap();
        std::fs::write(nested.join("notes.json"), "{}").unwrap();

        let discovery = ExtensionDiscovery::default().with_search_path(temp.path());
        let found = discovery.discover().await.unwrap();

        assert_eq!(found.len(), 2);
        let base = found.iter().find(|d| d.manifest.id == "base").unwrap();
        assert_eq!(base.manifest.title.as_deref(), Some("Base"));
        assert_eq!(base.manifest.settings["color"], "blue");
        assert_eq!(base.manifest.settings["size"], 3);
        assert_eq!(base.manifest.path.as_deref(), Some(temp.path()));

        let addon = found.iter().find(|d| d.manifest.id == "addon").unwrap();
        assert_eq!(addon.manifest.dependencies, vec!["base"]);
    }

    #[tokio::test]
    async fn test_malformed_file_is_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("bad.extension.json"), "{ not json").unwrap();

        let discovery = ExtensionDiscovery::default().with_search_path(temp.path());
        assert!(matches!(discovery.discover().await, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_missing_search_path_is_empty() {
        let discovery = ExtensionDiscovery::new(".ext.json").with_search_path("/nonexistent/prana");
        assert!(discovery.discover().await.unwrap().is_empty());
    }
}
