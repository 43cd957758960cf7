//! Item Sources - 카테고리 시드 아이템 공급원
//!
//! 카테고리를 수집할 때 훅보다 먼저 소스들이 초기 아이템을 공급한다.
//! 여러 소스의 결과는 등록 순서대로 합쳐지고, 같은 키는 나중 소스가 이긴다.

use crate::hook::Items;
use crate::scan::{find_files_with_suffix, stem_without_suffix};
use async_trait::async_trait;
use parking_lot::RwLock;
use prana_foundation::{parse_jsonc, Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// 아이템 공급원 트레이트
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// 소스 이름 (로그/에러용)
    fn name(&self) -> &str;

    /// 카테고리의 아이템 조회
    async fn scan(&self, category: &str) -> Result<Items>;
}

// ============================================================================
// JsonItemSource
// ============================================================================

/// 디스크의 `<key>.<category>.json` 파일에서 아이템을 읽는 소스
///
/// 아이템 키는 `name` 속성, 없으면 `key` 속성, 없으면 파일 이름에서 접미사를 뗀 값이다.
#[derive(Debug, Clone)]
pub struct JsonItemSource {
    roots: Vec<PathBuf>,
}

impl JsonItemSource {
    pub fn new(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn item_key(value: &Value) -> Option<String> {
        ["name", "key"].iter().find_map(|property| match value.get(*property) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }
}

#[async_trait]
impl ItemSource for JsonItemSource {
    fn name(&self) -> &str {
        "json"
    }

    async fn scan(&self, category: &str) -> Result<Items> {
        let suffix = format!(".{}.json", category);
        let files = find_files_with_suffix(&self.roots, &suffix)
            .await
            .map_err(|e| Error::item_source(self.name(), category, e.to_string()))?;

        let mut items = Items::new();
        for file in files {
            let content = fs::read_to_string(&file)
                .await
                .map_err(|e| Error::item_source(self.name(), category, format!("{}: {}", file.display(), e)))?;
            let value: Value = parse_jsonc(&content)
                .map_err(|e| Error::item_source(self.name(), category, format!("{}: {}", file.display(), e)))?;

            let key = Self::item_key(&value)
                .or_else(|| stem_without_suffix(&file, &suffix))
                .ok_or_else(|| {
                    Error::item_source(
                        self.name(),
                        category,
                        format!("cannot derive item key for {}", file.display()),
                    )
                })?;

            debug!("Loaded {} item {} from {:?}", category, key, file);
            items.insert(key, value);
        }

        Ok(items)
    }
}

// ============================================================================
// StaticItemSource
// ============================================================================

/// 메모리에 들고 있는 아이템 소스
#[derive(Debug, Default)]
pub struct StaticItemSource {
    name: String,
    items: RwLock<HashMap<String, Items>>,
}

impl StaticItemSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_item(self, category: &str, key: impl Into<String>, value: Value) -> Self {
        self.insert(category, key, value);
        self
    }

    pub fn insert(&self, category: &str, key: impl Into<String>, value: Value) {
        self.items
            .write()
            .entry(category.to_string())
            .or_default()
            .insert(key.into(), value);
    }

    pub fn remove(&self, category: &str, key: &str) -> Option<Value> {
        self.items.write().get_mut(category)?.remove(key)
    }
}

#[async_trait]
impl ItemSource for StaticItemSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn scan(&self, category: &str) -> Result<Items> {
        Ok(self.items.read().get(category).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_json_source_keys() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("more");
        std::fs::create_dir_all(&nested).unwrap();

        std::fs::write(temp.path().join("a.widget.json"), r#"{"name": "alpha"}"#).unwrap();
        std::fs::write(temp.path().join("b.widget.json"), r#"{"key": "beta"}"#).unwrap();
        std::fs::write(nested.join("gamma.widget.json"), r#"{"v": 1}"#).unwrap();
        std::fs::write(nested.join("other.gadget.json"), r#"{"v": 2}"#).unwrap();

        let source = JsonItemSource::new([temp.path()]);
        let items = source.scan("widget").await.unwrap();

        assert_eq!(items.len(), 3);
        assert!(items.contains_key("alpha"));
        assert!(items.contains_key("beta"));
        assert_eq!(items["gamma"], json!({"v": 1}));
    }

    #[tokio::test]
    async fn test_json_source_parse_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("bad.widget.json"), "{").unwrap();

        let source = JsonItemSource::new([temp.path()]);
        let err = source.scan("widget").await.unwrap_err();
        assert!(matches!(err, Error::Source { ref source_name, .. } if source_name == "json"));
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticItemSource::new("memory").with_item("widget", "x", json!({"v": 1}));

        assert_eq!(source.scan("widget").await.unwrap().len(), 1);
        assert!(source.scan("gadget").await.unwrap().is_empty());
        assert_eq!(source.remove("widget", "x"), Some(json!({"v": 1})));
    }
}
