//! prana-core: Core Runtime for Prana
//!
//! Layer2 - 확장 의존성 그래프, 훅 실행, 카테고리 수집 레이어
//!
//! # 주요 모듈
//!
//! - `extension`: 확장 등록, 의존성 체인 해결, 디스크 발견
//! - `task`: 의존성 그래프와 동시 실행기
//! - `hook`: 훅 타입, 공유 결과 병합, 훅 실행기
//! - `collection`: 카테고리, 아이템 소스, 수집 캐시
//! - `runtime`: 위 구성요소를 묶는 공유 핸들과 이벤트
//!
//! # 사용 예시
//!
//! ```ignore
//! use prana_core::{ExtensionDescriptor, Runtime};
//!
//! let runtime = Runtime::new();
//!
//! runtime
//!     .register(ExtensionDescriptor::new("base").with_fold_hook("widget", |call| async move {
//!         let mut items = call.items;
//!         items.insert("x".into(), json!({"id": "x", "v": 1}));
//!         Ok(items)
//!     }))
//!     .await?;
//!
//! runtime
//!     .register(ExtensionDescriptor::new("addon").depends_on("base").with_fold_hook(
//!         "widget",
//!         |call| async move {
//!             let mut items = call.items;
//!             if let Some(Value::Object(x)) = items.get_mut("x") {
//!                 x.insert("v".into(), json!(2));
//!             }
//!             Ok(items)
//!         },
//!     ))
//!     .await?;
//!
//! let widgets = runtime.collect("widget").await?;
//! assert_eq!(widgets["x"]["v"], 2);
//! ```

pub mod collection;
pub mod extension;
pub mod hook;
pub mod runtime;
pub mod task;

mod scan;

// ============================================================================
// Re-exports
// ============================================================================

pub use collection::{
    Category, CategoryRegistry, CollectionCache, ItemSource, JsonItemSource, StaticItemSource,
};
pub use extension::{
    DependencyChain, DiscoveredExtension, ExtensionDescriptor, ExtensionDiscovery, ExtensionInfo,
    ExtensionManifest, ExtensionRegistry,
};
pub use hook::{
    FanOutCall, FoldCall, HookCatalog, HookHandler, HookMode, HookTable, Items, MergeReport,
    SharedResult, COLLECT_HOOK, INIT_HOOK,
};
pub use runtime::{EventBus, EventType, Runtime, RuntimeEvent};
pub use task::{topological_order, DagExecutor, TaskGraph};

pub use prana_foundation::{Error, MergeStrategy, Result, RuntimeConfig};
