//! Collector - 카테고리 하나를 실제로 수집
//!
//! 1. 아이템 소스들에서 시드 수집 (등록 순서대로 병합)
//! 2. 시드 정규화
//! 3. 카테고리 이름의 Fold 훅
//! 4. 전역 `collect` Fold 훅
//!
//! 정규화는 시드에만 적용된다. 훅이 추가하거나 고친 아이템은 그대로 들어간다.

use super::category::Category;
use crate::hook::{FoldRequest, Items, SharedResult, COLLECT_HOOK};
use crate::runtime::Runtime;
use futures::future::try_join_all;
use prana_foundation::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// 카테고리 수집 (캐시 없이)
pub(crate) async fn collect_category(runtime: &Runtime, category: Arc<Category>) -> Result<Items> {
    let name = category.name().to_string();
    let seed = category.process_all(gather_seed(runtime, &name).await?);
    debug!("Seeded category {} with {} items", name, seed.len());

    let shared = Arc::new(SharedResult::new(seed, runtime.config().merge_strategy));

    for hook in [name.as_str(), COLLECT_HOOK] {
        let targets = runtime.hook_targets(hook).await?;
        let request = FoldRequest::new(hook, name.as_str(), Arc::clone(&shared))
            .with_args(Value::Null);
        runtime.invoker().fold(runtime, targets, request).await?;
    }

    Ok(shared.take())
}

async fn gather_seed(runtime: &Runtime, category: &str) -> Result<Items> {
    let sources = runtime.item_sources();
    let scanned = try_join_all(sources.iter().map(|source| source.scan(category))).await?;

    let mut seed = Items::new();
    for (source, items) in sources.iter().zip(scanned) {
        debug!(
            "Source {} supplied {} {} items",
            source.name(),
            items.len(),
            category
        );
        seed.extend(items);
    }
    Ok(seed)
}
