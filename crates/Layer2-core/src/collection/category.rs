//! Category - 수집 가능한 아이템 종류
//!
//! 카테고리 이름은 곧 해당 카테고리를 수집하는 Fold 훅 이름이다.

use crate::hook::{Items, COLLECT_HOOK, INIT_HOOK};
use parking_lot::RwLock;
use prana_foundation::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 기본 키 속성
pub const DEFAULT_KEY_PROPERTY: &str = "name";

/// 아이템 후처리 함수 (키, 값) → 값
pub type ItemProcessor = Arc<dyn Fn(&str, Value) -> Value + Send + Sync>;

/// 카테고리 정의
#[derive(Clone)]
pub struct Category {
    name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    key_property: String,
    processor: Option<ItemProcessor>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            key_property: DEFAULT_KEY_PROPERTY.to_string(),
            processor: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 아이템 키를 기록할 속성 이름
    pub fn with_key_property(mut self, property: impl Into<String>) -> Self {
        self.key_property = property.into();
        self
    }

    pub fn with_processor<F>(mut self, processor: F) -> Self
    where
        F: Fn(&str, Value) -> Value + Send + Sync + 'static,
    {
        self.processor = Some(Arc::new(processor));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_property(&self) -> &str {
        &self.key_property
    }

    /// 아이템 하나 정규화
    ///
    /// 후처리 함수를 먼저 적용하고, 객체 아이템에 키 속성이 없으면 키를 채운다.
    pub fn process(&self, key: &str, value: Value) -> Value {
        let mut value = match &self.processor {
            Some(processor) => processor(key, value),
            None => value,
        };

        if let Value::Object(map) = &mut value {
            if !map.contains_key(&self.key_property) {
                map.insert(self.key_property.clone(), Value::String(key.to_string()));
            }
        }
        value
    }

    /// 모든 아이템 정규화 (null 아이템은 버린다)
    pub fn process_all(&self, items: Items) -> Items {
        items
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| {
                let value = self.process(&key, value);
                (key, value)
            })
            .collect()
    }
}

impl std::fmt::Debug for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Category")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("key_property", &self.key_property)
            .field("processor", &self.processor.is_some())
            .finish()
    }
}

/// 카테고리 이름 검증 (비어있거나 예약된 훅 이름이면 거부)
pub fn validate_category_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("category name must not be empty".to_string()));
    }
    if name == INIT_HOOK || name == COLLECT_HOOK {
        return Err(Error::InvalidInput(format!(
            "'{}' is a reserved hook name and cannot be used as a category",
            name
        )));
    }
    Ok(())
}

// ============================================================================
// CategoryRegistry
// ============================================================================

/// 정의된 카테고리 저장소
///
/// 정의되지 않은 카테고리도 수집할 수 있다 (기본 설정 사용).
#[derive(Debug, Default)]
pub struct CategoryRegistry {
    categories: RwLock<HashMap<String, Arc<Category>>>,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 카테고리 정의 (같은 이름이 있으면 교체)
    pub fn define(&self, category: Category) -> Result<()> {
        validate_category_name(category.name())?;
        debug!("Defining category {}", category.name());
        self.categories
            .write()
            .insert(category.name().to_string(), Arc::new(category));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<Category>> {
        self.categories.read().get(name).cloned()
    }

    /// 정의된 카테고리 또는 기본 카테고리
    pub fn resolve(&self, name: &str) -> Result<Arc<Category>> {
        validate_category_name(name)?;
        Ok(self
            .get(name)
            .unwrap_or_else(|| Arc::new(Category::new(name))))
    }

    /// 정렬된 카테고리 이름
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.categories.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_process_fills_key_property() {
        let category = Category::new("widget");
        assert_eq!(category.process("x", json!({"v": 1})), json!({"v": 1, "name": "x"}));
        assert_eq!(
            category.process("x", json!({"name": "kept"})),
            json!({"name": "kept"})
        );
        assert_eq!(category.process("x", json!(5)), json!(5));
    }

    #[test]
    fn test_custom_key_and_processor() {
        let category = Category::new("widget")
            .with_key_property("id")
            .with_processor(|_key, mut value| {
                if let Value::Object(map) = &mut value {
                    map.insert("processed".into(), json!(true));
                }
                value
            });

        assert_eq!(
            category.process("x", json!({})),
            json!({"processed": true, "id": "x"})
        );
    }

    #[test]
    fn test_process_all_drops_nulls() {
        let mut items = Items::new();
        items.insert("a".into(), json!({}));
        items.insert("b".into(), Value::Null);

        let processed = Category::new("widget").process_all(items);
        assert_eq!(processed.len(), 1);
        assert_eq!(processed["a"], json!({"name": "a"}));
    }

    #[test]
    fn test_reserved_names_rejected() {
        let registry = CategoryRegistry::new();
        assert!(matches!(registry.define(Category::new("init")), Err(Error::InvalidInput(_))));
        assert!(matches!(registry.resolve("collect"), Err(Error::InvalidInput(_))));
        assert!(matches!(registry.resolve(""), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_resolve_defaults() {
        let registry = CategoryRegistry::new();
        registry
            .define(Category::new("widget").with_key_property("id"))
            .unwrap();

        assert_eq!(registry.resolve("widget").unwrap().key_property(), "id");
        assert_eq!(registry.resolve("gadget").unwrap().key_property(), "name");
        assert_eq!(registry.names(), vec!["widget"]);
    }
}
