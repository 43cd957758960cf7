//! Collection Cache - 카테고리별 수집 결과 메모
//!
//! - 한 카테고리에 대한 동시 수집은 한 번만 계산된다 (single flight)
//! - 실패한 수집은 기억하지 않는다
//! - 수집 도중에 무효화되면 그 결과는 기억하지 않는다
//! - 계산이 끝나고 기다리는 호출이 없으면 카테고리별 잠금도 지운다

use crate::hook::Items;
use parking_lot::Mutex;
use prana_foundation::Result;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
struct MemoState {
    entries: HashMap<String, Arc<Items>>,
    /// 카테고리별 무효화 횟수
    epochs: HashMap<String, u64>,
    /// 전체 무효화 횟수
    global_epoch: u64,
}

impl MemoState {
    fn ticket(&self, category: &str) -> (u64, u64) {
        (
            self.global_epoch,
            self.epochs.get(category).copied().unwrap_or(0),
        )
    }
}

type FlightMap = HashMap<String, Arc<tokio::sync::Mutex<()>>>;

/// 진행 중인 계산 하나에 대한 참여권
///
/// 마지막 참여자가 놓을 때 맵에서 잠금을 지운다.
struct Flight<'a> {
    flights: &'a Mutex<FlightMap>,
    category: &'a str,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        let mut flights = self.flights.lock();
        // 맵과 자기 자신만 들고 있으면 기다리는 호출이 없다
        if Arc::strong_count(&self.lock) == 2 {
            flights.remove(self.category);
        }
    }
}

/// 수집 결과 캐시
#[derive(Default)]
pub struct CollectionCache {
    state: Mutex<MemoState>,
    flights: Mutex<FlightMap>,
}

impl CollectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: &str) -> Option<Arc<Items>> {
        self.state.lock().entries.get(category).cloned()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.state.lock().entries.contains_key(category)
    }

    /// 기억된 카테고리 이름 (정렬됨)
    pub fn categories(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// 기억된 결과를 돌려주거나 `compute`로 계산
    ///
    /// 같은 카테고리의 동시 호출은 앞선 계산을 기다렸다가 그 결과를 받는다.
    /// 앞선 계산이 실패했으면 다음 호출이 다시 계산한다.
    pub async fn get_or_compute<F, Fut>(&self, category: &str, compute: F) -> Result<Arc<Items>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Items>>,
    {
        if let Some(hit) = self.get(category) {
            return Ok(hit);
        }

        let flight = self.flight(category);
        let _guard = flight.lock.lock().await;

        if let Some(hit) = self.get(category) {
            debug!("Category {} computed by a concurrent caller", category);
            return Ok(hit);
        }

        let ticket = self.state.lock().ticket(category);
        let items = Arc::new(compute().await?);

        let mut state = self.state.lock();
        if state.ticket(category) == ticket {
            state.entries.insert(category.to_string(), Arc::clone(&items));
        } else {
            debug!("Category {} was invalidated during collection, not memoizing", category);
        }

        Ok(items)
    }

    /// 무효화 (`None`이면 전체). 지워진 항목 수 반환
    pub fn invalidate(&self, category: Option<&str>) -> usize {
        let mut state = self.state.lock();
        match category {
            Some(category) => {
                *state.epochs.entry(category.to_string()).or_insert(0) += 1;
                usize::from(state.entries.remove(category).is_some())
            }
            None => {
                state.global_epoch += 1;
                let removed = state.entries.len();
                state.entries.clear();
                removed
            }
        }
    }

    fn flight<'a>(&'a self, category: &'a str) -> Flight<'a> {
        let mut flights = self.flights.lock();
        let lock = Arc::clone(flights.entry(category.to_string()).or_default());
        Flight {
            flights: &self.flights,
            category,
            lock,
        }
    }
}

impl std::fmt::Debug for CollectionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionCache")
            .field("categories", &self.categories())
            .finish()
    }
}
