//! Extension Descriptor - 등록 단위 (매니페스트 + 훅 구현)

use super::manifest::ExtensionManifest;
use crate::hook::{FanOutCall, FoldCall, HookHandler, HookTable, Items, INIT_HOOK};
use prana_foundation::Result;
use serde_json::Value;
use std::future::Future;

/// 런타임에 등록할 확장
#[derive(Debug, Clone)]
pub struct ExtensionDescriptor {
    pub manifest: ExtensionManifest,
    pub hooks: HookTable,
}

impl ExtensionDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self::from_manifest(ExtensionManifest::new(id), HookTable::new())
    }

    pub fn from_manifest(manifest: ExtensionManifest, hooks: HookTable) -> Self {
        Self { manifest, hooks }
    }

    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.manifest = self.manifest.with_dependency(id);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.manifest = self.manifest.with_title(title);
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.manifest = self.manifest.with_setting(key, value);
        self
    }

    pub fn with_hook(mut self, name: impl Into<String>, handler: HookHandler) -> Self {
        self.hooks.insert(name, handler);
        self
    }

    /// Fold 훅 추가 (카테고리 이름 또는 `collect`)
    pub fn with_fold_hook<F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(FoldCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Items>> + Send + 'static,
    {
        self.with_hook(name, HookHandler::fold(f))
    }

    /// FanOut 훅 추가
    pub fn with_fan_out_hook<F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(FanOutCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.with_hook(name, HookHandler::fan_out(f))
    }

    /// `init` 훅 추가
    pub fn with_init<F, Fut>(self, f: F) -> Self
    where
        F: Fn(FanOutCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.with_fan_out_hook(INIT_HOOK, f)
    }
}
