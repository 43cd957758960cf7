//! Hook 타입 정의
//!
//! 훅은 두 가지 방식으로 호출된다.
//! - Fold: 공유 아이템 맵을 받아서 갱신된 맵을 돌려준다 (카테고리 수집)
//! - FanOut: 각 확장이 독립적인 값을 돌려준다 (`init` 등)

use crate::runtime::Runtime;
use futures::future::BoxFuture;
use futures::FutureExt;
use prana_foundation::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// 초기화 훅 이름
pub const INIT_HOOK: &str = "init";

/// 모든 카테고리 수집 뒤에 실행되는 전역 훅 이름
pub const COLLECT_HOOK: &str = "collect";

/// 키 → 아이템 맵
pub type Items = serde_json::Map<String, Value>;

// ============================================================================
// Call Context
// ============================================================================

/// Fold 훅 호출 인자
#[derive(Clone)]
pub struct FoldCall {
    /// 런타임 핸들
    pub runtime: Runtime,
    /// 호출되는 확장 ID
    pub extension: String,
    /// 훅 이름
    pub hook: String,
    /// 수집 중인 카테고리
    pub category: String,
    /// 선행 확장들의 기여가 반영된 아이템 스냅샷
    pub items: Items,
    /// 호출자가 넘긴 추가 인자
    pub args: Value,
}

/// FanOut 훅 호출 인자
#[derive(Clone)]
pub struct FanOutCall {
    pub runtime: Runtime,
    pub extension: String,
    pub hook: String,
    pub args: Value,
}

impl std::fmt::Debug for FoldCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FoldCall")
            .field("extension", &self.extension)
            .field("hook", &self.hook)
            .field("category", &self.category)
            .field("items", &self.items.len())
            .finish()
    }
}

impl std::fmt::Debug for FanOutCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOutCall")
            .field("extension", &self.extension)
            .field("hook", &self.hook)
            .finish()
    }
}

// ============================================================================
// HookHandler
// ============================================================================

pub type FoldHook = Arc<dyn Fn(FoldCall) -> BoxFuture<'static, Result<Items>> + Send + Sync>;
pub type FanOutHook = Arc<dyn Fn(FanOutCall) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// 호출 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookMode {
    Fold,
    FanOut,
}

impl std::fmt::Display for HookMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fold => write!(f, "fold"),
            Self::FanOut => write!(f, "fan-out"),
        }
    }
}

/// 확장이 제공하는 훅 구현
#[derive(Clone)]
pub enum HookHandler {
    Fold(FoldHook),
    FanOut(FanOutHook),
}

impl HookHandler {
    pub fn fold<F, Fut>(f: F) -> Self
    where
        F: Fn(FoldCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Items>> + Send + 'static,
    {
        Self::Fold(Arc::new(move |call| f(call).boxed()))
    }

    pub fn fan_out<F, Fut>(f: F) -> Self
    where
        F: Fn(FanOutCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self::FanOut(Arc::new(move |call| f(call).boxed()))
    }

    pub fn mode(&self) -> HookMode {
        match self {
            Self::Fold(_) => HookMode::Fold,
            Self::FanOut(_) => HookMode::FanOut,
        }
    }
}

impl std::fmt::Debug for HookHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HookHandler({})", self.mode())
    }
}

// ============================================================================
// HookTable
// ============================================================================

/// 훅 이름 → 구현
#[derive(Clone, Default)]
pub struct HookTable {
    handlers: HashMap<String, HookHandler>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 훅 등록 (같은 이름이 있으면 교체하고 이전 구현 반환)
    pub fn insert(&mut self, name: impl Into<String>, handler: HookHandler) -> Option<HookHandler> {
        self.handlers.insert(name.into(), handler)
    }

    pub fn with_fold<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(FoldCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Items>> + Send + 'static,
    {
        self.insert(name, HookHandler::fold(f));
        self
    }

    pub fn with_fan_out<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(FanOutCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.insert(name, HookHandler::fan_out(f));
        self
    }

    pub fn get(&self, name: &str) -> Option<&HookHandler> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// 정렬된 훅 이름 목록
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HookTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.handlers.iter().map(|(k, v)| (k, v.mode())))
            .finish()
    }
}

/// 디스크에서 찾은 확장 ID → 훅 구현
///
/// 항목이 없는 확장은 데이터만 가진 확장으로 등록된다.
pub type HookCatalog = HashMap<String, HookTable>;
