//! Runtime - 확장, 카테고리, 수집 캐시를 묶는 공유 핸들
//!
//! [`Runtime`]은 내부 상태를 `Arc`로 공유하므로 복제해서 여러 태스크에 넘길 수 있다.
//! 훅 구현도 호출 인자로 같은 핸들을 받는다.
//!
//! ## 사용 예시
//!
//! ```ignore
//! let runtime = Runtime::with_config(RuntimeConfig::load()?)?;
//! runtime
//!     .register(ExtensionDescriptor::new("base").with_fold_hook("widget", |call| async move {
//!         let mut items = call.items;
//!         items.insert("x".into(), json!({"id": "x", "v": 1}));
//!         Ok(items)
//!     }))
//!     .await?;
//!
//! runtime.init().await?;
//! let widgets = runtime.collect("widget").await?;
//! ```

mod events;

pub use events::{EventBus, EventType, RuntimeEvent};

use crate::collection::{
    collector, Category, CategoryRegistry, CollectionCache, ItemSource, JsonItemSource,
};
use crate::extension::{
    DependencyChain, ExtensionDescriptor, ExtensionDiscovery, ExtensionInfo, ExtensionRegistry,
};
use crate::hook::{
    FoldRequest, HookCatalog, HookInvoker, HookTarget, Items, SharedResult, INIT_HOOK,
};
use crate::task::DagExecutor;
use parking_lot::RwLock;
use prana_foundation::{Error, Result, RuntimeConfig};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

struct RuntimeInner {
    config: RuntimeConfig,
    registry: ExtensionRegistry,
    categories: CategoryRegistry,
    sources: RwLock<Vec<Arc<dyn ItemSource>>>,
    invoker: HookInvoker,
    cache: CollectionCache,
    events: EventBus,
}

/// Prana 런타임
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// 기본 설정으로 생성
    pub fn new() -> Self {
        Self::build(RuntimeConfig::default())
    }

    /// 설정 검증 후 생성
    ///
    /// `itemPaths`가 있으면 JSON 아이템 소스가 자동으로 추가된다.
    pub fn with_config(config: RuntimeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: RuntimeConfig) -> Self {
        let mut sources: Vec<Arc<dyn ItemSource>> = Vec::new();
        if !config.item_paths.is_empty() {
            sources.push(Arc::new(JsonItemSource::new(config.item_paths.iter().cloned())));
        }

        let executor = DagExecutor::from_limit(config.max_concurrency);
        debug!(
            "Creating runtime (merge: {}, concurrency: {:?}, common: {:?})",
            config.merge_strategy,
            executor.max_concurrent(),
            config.common_dependencies
        );

        Self {
            inner: Arc::new(RuntimeInner {
                config,
                registry: ExtensionRegistry::new(),
                categories: CategoryRegistry::new(),
                sources: RwLock::new(sources),
                invoker: HookInvoker::new(executor),
                cache: CollectionCache::new(),
                events: EventBus::new(),
            }),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.inner.registry
    }

    pub fn categories(&self) -> &CategoryRegistry {
        &self.inner.categories
    }

    pub fn cache(&self) -> &CollectionCache {
        &self.inner.cache
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// 런타임 이벤트 구독
    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.inner.events.subscribe()
    }

    pub(crate) fn invoker(&self) -> &HookInvoker {
        &self.inner.invoker
    }

    /// 훅 호출 대상 (무효화된 체인은 먼저 다시 해결)
    pub(crate) async fn hook_targets(&self, hook: &str) -> Result<Vec<HookTarget>> {
        self.inner
            .registry
            .targets(hook, &self.inner.config.common_dependencies)
            .await
    }

    pub(crate) fn item_sources(&self) -> Vec<Arc<dyn ItemSource>> {
        self.inner.sources.read().clone()
    }

    // ========================================================================
    // Extensions
    // ========================================================================

    /// 확장 등록
    ///
    /// 의존성 체인과 기억된 수집 결과가 모두 무효화된다.
    pub async fn register(&self, descriptor: ExtensionDescriptor) -> Result<()> {
        let id = descriptor.id().to_string();
        let load_order = self.inner.registry.register(descriptor).await?;

        let dropped = self.inner.cache.invalidate(None);
        if dropped > 0 {
            debug!("Registration of {} dropped {} memoized categories", id, dropped);
        }

        self.inner
            .events
            .publish(RuntimeEvent::extension_registered(&id, load_order));
        Ok(())
    }

    pub async fn extension(&self, id: &str) -> Option<ExtensionInfo> {
        self.inner.registry.get(id).await
    }

    /// 등록 순서대로 정렬된 확장 목록
    pub async fn extensions(&self) -> Vec<ExtensionInfo> {
        self.inner.registry.list().await
    }

    /// 확장의 해결된 의존성 체인
    pub async fn chain(&self, id: &str) -> Result<DependencyChain> {
        self.resolve().await?;
        self.inner
            .registry
            .chain(id)
            .await
            .ok_or_else(|| Error::NotFound(format!("extension {}", id)))
    }

    /// 설정된 검색 경로에서 확장 발견 및 등록
    pub async fn load_extensions(&self, catalog: HookCatalog) -> Result<Vec<String>> {
        let paths = self.inner.config.extension_paths.clone();
        self.load_extensions_from(&paths, catalog).await
    }

    /// 지정한 경로에서 확장 발견 및 등록
    ///
    /// 발견된 확장의 훅 구현은 `catalog`에서 ID로 찾는다. 항목이 없으면 데이터만 가진
    /// 확장으로 등록된다.
    pub async fn load_extensions_from(
        &self,
        paths: &[PathBuf],
        mut catalog: HookCatalog,
    ) -> Result<Vec<String>> {
        let discovery = paths.iter().fold(
            ExtensionDiscovery::new(self.inner.config.extension_suffix.clone()),
            |discovery, path| discovery.with_search_path(path.clone()),
        );

        let mut loaded = Vec::new();
        for found in discovery.discover().await? {
            let hooks = catalog.remove(&found.manifest.id).unwrap_or_default();
            let id = found.manifest.id.clone();
            self.register(ExtensionDescriptor::from_manifest(found.manifest, hooks))
                .await?;
            loaded.push(id);
        }

        for id in catalog.keys() {
            warn!("Hook implementations for {} have no extension declaration", id);
        }

        info!("Loaded {} extensions from disk", loaded.len());
        Ok(loaded)
    }

    /// 의존성 체인 해결 (이미 해결되어 있으면 아무것도 하지 않음)
    pub async fn resolve(&self) -> Result<()> {
        if self.inner.registry.is_resolved().await {
            return Ok(());
        }
        self.inner
            .registry
            .resolve(&self.inner.config.common_dependencies)
            .await
    }

    /// 모든 확장의 `init` 훅 실행
    ///
    /// 의존성 검증이 먼저 일어나므로 검증에 실패하면 어떤 훅도 실행되지 않는다.
    pub async fn init(&self) -> Result<HashMap<String, Value>> {
        let results = self.invoke(INIT_HOOK, Value::Null).await?;
        let extensions = self.inner.registry.len().await;
        info!(
            "Runtime initialized: {} extensions, {} init hooks",
            extensions,
            results.len()
        );
        self.inner
            .events
            .publish(RuntimeEvent::initialized(extensions, results.len()));
        Ok(results)
    }

    // ========================================================================
    // Hooks
    // ========================================================================

    /// FanOut 훅 호출 - 구현한 확장별 반환값
    pub async fn invoke(&self, hook: &str, args: Value) -> Result<HashMap<String, Value>> {
        let outcome = async {
            let targets = self.hook_targets(hook).await?;
            self.inner.invoker.fan_out(self, targets, hook, args).await
        }
        .await;

        self.report_failure(hook, outcome)
    }

    /// Fold 훅 호출 - `seed`에서 시작해서 모든 확장의 기여를 반영한 맵
    pub async fn fold(&self, hook: &str, seed: Items, args: Value) -> Result<Items> {
        let outcome = async {
            let targets = self.hook_targets(hook).await?;
            let shared = Arc::new(SharedResult::new(seed, self.inner.config.merge_strategy));
            let request = FoldRequest::new(hook, hook, Arc::clone(&shared)).with_args(args);
            self.inner.invoker.fold(self, targets, request).await?;
            Ok(shared.take())
        }
        .await;

        self.report_failure(hook, outcome)
    }

    fn report_failure<T>(&self, hook: &str, outcome: Result<T>) -> Result<T> {
        if let Err(e) = &outcome {
            self.inner
                .events
                .publish(RuntimeEvent::invocation_failed(hook, e));
        }
        outcome
    }

    // ========================================================================
    // Categories & Items
    // ========================================================================

    /// 카테고리 정의 (기존 정의와 기억된 결과를 교체)
    pub fn define_category(&self, category: Category) -> Result<()> {
        let name = category.name().to_string();
        self.inner.categories.define(category)?;
        self.invalidate(Some(&name));
        Ok(())
    }

    /// 아이템 소스 추가 (기존 소스 뒤에 병합됨)
    pub fn add_item_source(&self, source: Arc<dyn ItemSource>) {
        debug!("Adding item source {}", source.name());
        self.inner.sources.write().push(source);
        self.invalidate(None);
    }

    /// 카테고리 수집
    ///
    /// 결과는 무효화될 때까지 기억되고, 같은 `Arc`가 반환된다. 실패한 수집은
    /// 기억되지 않으므로 다음 호출이 다시 시도한다.
    pub async fn collect(&self, category: &str) -> Result<Arc<Items>> {
        let definition = self.inner.categories.resolve(category)?;
        let runtime = self.clone();

        let outcome = self
            .inner
            .cache
            .get_or_compute(category, || async move {
                runtime.resolve().await?;
                let items = collector::collect_category(&runtime, definition).await?;
                info!("Collected {} {} items", items.len(), category);
                runtime
                    .inner
                    .events
                    .publish(RuntimeEvent::category_collected(category, items.len()));
                Ok(items)
            })
            .await;

        self.report_failure(category, outcome)
    }

    /// 기억된 수집 결과 무효화 (`None`이면 전체)
    pub fn invalidate(&self, category: Option<&str>) {
        let dropped = self.inner.cache.invalidate(category);
        debug!("Invalidated {:?} ({} memoized results dropped)", category, dropped);
        self.inner
            .events
            .publish(RuntimeEvent::category_invalidated(category));
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.inner.config)
            .field("cache", &self.inner.cache)
            .finish()
    }
}
