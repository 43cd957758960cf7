//! Extension Manifest - 확장 메타데이터 정의

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// 확장 매니페스트
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionManifest {
    /// 고유 확장 ID
    pub id: String,

    /// 표시 이름
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 선언된 의존성 (공통 의존성은 제외)
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// 선언 파일에 있던 나머지 설정 값
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub settings: Map<String, Value>,

    /// 선언 파일 경로 (디스크에서 찾은 경우)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl ExtensionManifest {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// 빌더 패턴: 표시 이름 설정
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// 빌더 패턴: 설명 설정
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 빌더 패턴: 의존성 추가 (중복 무시)
    pub fn with_dependency(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        if !self.dependencies.contains(&id) {
            self.dependencies.push(id);
        }
        self
    }

    /// 빌더 패턴: 설정 값 추가
    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// 표시 이름 (없으면 ID)
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let manifest = ExtensionManifest::new("addon")
            .with_title("Addon")
            .with_dependency("base")
            .with_dependency("base")
            .with_setting("color", json!("red"));

        assert_eq!(manifest.dependencies, vec!["base"]);
        assert_eq!(manifest.display_name(), "Addon");
        assert_eq!(manifest.settings["color"], json!("red"));
        assert_eq!(ExtensionManifest::new("bare").display_name(), "bare");
    }
}
