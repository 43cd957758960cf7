//! Extension Registry - 확장 저장소
//!
//! 등록 순서를 기억하고, 공통 의존성을 반영한 의존성 체인을 계산한다.
//! 체인은 등록이 바뀌면 무효화되고 다음 호출 전에 다시 계산된다.

use super::chain::DependencyChain;
use super::descriptor::ExtensionDescriptor;
use super::manifest::ExtensionManifest;
use crate::hook::{HookTable, HookTarget};
use crate::task::topological_order;
use prana_foundation::{Error, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// 등록된 확장 정보
#[derive(Debug, Clone)]
pub struct ExtensionInfo {
    pub manifest: ExtensionManifest,

    /// 구현한 훅 이름 (정렬됨)
    pub hooks: Vec<String>,

    /// 해결된 의존성 체인 (아직 해결 전이면 None)
    pub chain: Option<DependencyChain>,

    /// 등록 순서
    pub load_order: usize,
}

struct ExtensionEntry {
    manifest: ExtensionManifest,
    hooks: HookTable,
    chain: Option<DependencyChain>,
    load_order: usize,
}

impl ExtensionEntry {
    fn info(&self) -> ExtensionInfo {
        ExtensionInfo {
            manifest: self.manifest.clone(),
            hooks: self.hooks.names(),
            chain: self.chain.clone(),
            load_order: self.load_order,
        }
    }
}

#[derive(Default)]
struct RegistryState {
    extensions: HashMap<String, ExtensionEntry>,
    load_counter: usize,
    resolved: bool,
}

impl RegistryState {
    fn ordered(&self) -> Vec<&ExtensionEntry> {
        let mut entries: Vec<_> = self.extensions.values().collect();
        entries.sort_by_key(|e| e.load_order);
        entries
    }

    fn resolve(&mut self, common: &[String]) -> Result<()> {
        let mut chains: Vec<(String, DependencyChain)> = Vec::with_capacity(self.extensions.len());
        for entry in self.ordered() {
            let id = &entry.manifest.id;
            let chain = DependencyChain::build(id, &entry.manifest.dependencies, common);

            let missing: Vec<String> = chain
                .iter()
                .filter(|dep| !self.extensions.contains_key(dep.as_str()))
                .cloned()
                .collect();

            if !missing.is_empty() {
                warn!("Extension {} has missing dependencies: {:?}", id, missing);
                return Err(Error::MissingDependencies {
                    extension: id.clone(),
                    missing,
                });
            }

            chains.push((id.clone(), chain));
        }

        topological_order(chains.iter().map(|(id, chain)| (id.as_str(), chain.as_slice())))?;

        for (id, chain) in chains {
            if let Some(entry) = self.extensions.get_mut(&id) {
                debug!("Resolved chain for {}: {}", id, chain);
                entry.chain = Some(chain);
            }
        }
        self.resolved = true;

        info!("Resolved dependency chains for {} extensions", self.extensions.len());
        Ok(())
    }
}

/// 확장 레지스트리
#[derive(Default)]
pub struct ExtensionRegistry {
    state: RwLock<RegistryState>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 확장 등록
    ///
    /// 같은 ID가 이미 있으면 `DuplicateExtension`. 등록이 성공하면 기존 체인은 무효화된다.
    pub async fn register(&self, descriptor: ExtensionDescriptor) -> Result<usize> {
        let ExtensionDescriptor { manifest, hooks } = descriptor;
        let id = manifest.id.clone();

        if id.trim().is_empty() {
            return Err(Error::InvalidInput("extension id must not be empty".to_string()));
        }

        let mut state = self.state.write().await;

        if state.extensions.contains_key(&id) {
            warn!("Extension {} is already registered", id);
            return Err(Error::DuplicateExtension(id));
        }

        state.load_counter += 1;
        let load_order = state.load_counter;

        debug!(
            "Registering extension {} (hooks: {:?}, dependencies: {:?})",
            id,
            hooks.names(),
            manifest.dependencies
        );

        state.extensions.insert(
            id.clone(),
            ExtensionEntry {
                manifest,
                hooks,
                chain: None,
                load_order,
            },
        );

        if state.resolved {
            debug!("Registration of {} invalidates resolved chains", id);
        }
        state.resolved = false;
        for entry in state.extensions.values_mut() {
            entry.chain = None;
        }

        info!("Extension registered: {} (order: {})", id, load_order);
        Ok(load_order)
    }

    pub async fn get(&self, id: &str) -> Option<ExtensionInfo> {
        self.state.read().await.extensions.get(id).map(ExtensionEntry::info)
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.state.read().await.extensions.contains_key(id)
    }

    /// 등록 순서대로 정렬된 확장 목록
    pub async fn list(&self) -> Vec<ExtensionInfo> {
        let state = self.state.read().await;
        state.ordered().into_iter().map(ExtensionEntry::info).collect()
    }

    /// 등록 순서대로 정렬된 확장 ID 목록
    pub async fn load_order(&self) -> Vec<String> {
        let state = self.state.read().await;
        state.ordered().into_iter().map(|e| e.manifest.id.clone()).collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.extensions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.extensions.is_empty()
    }

    pub async fn is_resolved(&self) -> bool {
        self.state.read().await.resolved
    }

    pub async fn chain(&self, id: &str) -> Option<DependencyChain> {
        self.state
            .read()
            .await
            .extensions
            .get(id)
            .and_then(|e| e.chain.clone())
    }

    // ========================================================================
    // 의존성 해결
    // ========================================================================

    /// 모든 확장의 의존성 체인 계산 및 검증
    ///
    /// - 등록되지 않은 의존성 → `MissingDependencies` (등록 순서상 첫 확장, 빠진 이름 전부)
    /// - 순환 → `DependencyCycle`
    ///
    /// 실패하면 아무 체인도 기록되지 않는다.
    pub async fn resolve(&self, common: &[String]) -> Result<()> {
        self.state.write().await.resolve(common)
    }

    /// 훅 호출 대상 목록 (등록 순서)
    ///
    /// 체인이 무효화되어 있으면 같은 잠금 안에서 먼저 다시 계산한다.
    pub async fn targets(&self, hook: &str, common: &[String]) -> Result<Vec<HookTarget>> {
        let mut state = self.state.write().await;
        if !state.resolved {
            state.resolve(common)?;
        }

        state
            .ordered()
            .into_iter()
            .map(|entry| {
                let chain = entry.chain.clone().ok_or_else(|| {
                    Error::Internal(format!("chain missing for {}", entry.manifest.id))
                })?;
                Ok(HookTarget {
                    extension: entry.manifest.id.clone(),
                    chain: chain.into_vec(),
                    handler: entry.hooks.get(hook).cloned(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn ext(id: &str, deps: &[&str]) -> ExtensionDescriptor {
        deps.iter()
            .fold(ExtensionDescriptor::new(id), |d, dep| d.depends_on(*dep))
    }

    #[tokio::test]
    async fn test_register_and_list_in_order() {
        let registry = ExtensionRegistry::new();
        registry.register(ext("b", &[])).await.unwrap();
        registry.register(ext("a", &[])).await.unwrap();

        assert_eq!(registry.load_order().await, vec!["b", "a"]);
        assert_eq!(registry.len().await, 2);
        assert!(registry.contains("a").await);
        assert!(registry.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let registry = ExtensionRegistry::new();
        registry.register(ext("a", &[])).await.unwrap();
        let err = registry.register(ext("a", &[])).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateExtension(id) if id == "a"));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_resolve_with_common_dependencies() {
        let registry = ExtensionRegistry::new();
        registry.register(ext("core", &[])).await.unwrap();
        registry.register(ext("addon", &["base"])).await.unwrap();
        registry.register(ext("base", &[])).await.unwrap();

        registry.resolve(&["core".to_string()]).await.unwrap();

        assert!(registry.is_resolved().await);
        assert!(registry.chain("core").await.unwrap().is_empty());
        assert_eq!(
            registry.chain("addon").await.unwrap().into_vec(),
            vec!["core", "base"]
        );
    }

    #[tokio::test]
    async fn test_missing_dependencies_listed() {
        let registry = ExtensionRegistry::new();
        registry.register(ext("addon", &["base", "theme"])).await.unwrap();

        match registry.resolve(&[]).await.unwrap_err() {
            Error::MissingDependencies { extension, missing } => {
                assert_eq!(extension, "addon");
                assert_eq!(missing, vec!["base", "theme"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!registry.is_resolved().await);
    }

    #[tokio::test]
    async fn test_cycle_detected() {
        let registry = ExtensionRegistry::new();
        registry.register(ext("a", &["b"])).await.unwrap();
        registry.register(ext("b", &["a"])).await.unwrap();

        let err = registry.resolve(&[]).await.unwrap_err();
        assert!(matches!(err, Error::DependencyCycle(ids) if ids == vec!["a", "b"]));
        assert!(registry.chain("a").await.is_none());
    }

    #[tokio::test]
    async fn test_register_after_resolve_invalidates() {
        let registry = ExtensionRegistry::new();
        registry.register(ext("a", &[])).await.unwrap();
        registry.resolve(&[]).await.unwrap();
        assert!(registry.targets("init", &[]).await.is_ok());

        registry.register(ext("b", &["a"])).await.unwrap();
        assert!(!registry.is_resolved().await);

        // 대상 조회가 무효화된 체인을 다시 계산한다
        let targets = registry.targets("init", &[]).await.unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].chain, vec!["a"]);
        assert!(registry.is_resolved().await);
    }

    #[tokio::test]
    async fn test_targets_report_stale_resolution_errors() {
        let registry = ExtensionRegistry::new();
        registry.register(ext("a", &[])).await.unwrap();
        registry.resolve(&[]).await.unwrap();

        registry.register(ext("b", &["missing"])).await.unwrap();
        let err = registry.targets("init", &[]).await.unwrap_err();
        assert!(matches!(err, Error::MissingDependencies { extension, .. } if extension == "b"));
        assert!(!registry.is_resolved().await);
    }

    #[tokio::test]
    async fn test_targets_include_data_only_extensions() {
        let registry = ExtensionRegistry::new();
        registry
            .register(ExtensionDescriptor::new("a").with_init(|_call| async { Ok(Value::Null) }))
            .await
            .unwrap();
        registry.register(ext("b", &["a"])).await.unwrap();
        registry.resolve(&[]).await.unwrap();

        let targets = registry.targets("init", &[]).await.unwrap();
        assert_eq!(targets.len(), 2);
        assert!(targets[0].handler.is_some());
        assert!(targets[1].handler.is_none());
        assert_eq!(targets[1].chain, vec!["a"]);
    }
}
