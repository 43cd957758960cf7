//! Shared Result - Fold 훅 기여를 하나의 아이템 맵으로 병합
//!
//! 각 확장은 시작 시점의 스냅샷을 받고, 끝나면 스냅샷과의 차이(추가/변경/삭제)만
//! 공유 맵에 반영한다. 그래서 동시에 실행된 형제 확장의 기여가 사라지지 않는다.
//!
//! 선행 확장의 기여는 항상 스냅샷에 들어있다 (선행 확장이 끝난 뒤에 시작하므로).
//! 확장이 null로 돌려준 아이템은 버려진다.

use super::types::Items;
use parking_lot::Mutex;
use prana_foundation::{Error, MergeStrategy, Result};
use serde_json::Value;
use std::collections::HashMap;

/// 공유 맵의 특정 시점 사본
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub items: Items,
    generation: u64,
}

/// 병합 결과 요약
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

impl MergeReport {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.updated == 0 && self.removed == 0
    }
}

enum Change {
    Upsert { key: String, value: Value },
    Remove { key: String },
}

impl Change {
    fn key(&self) -> &str {
        match self {
            Change::Upsert { key, .. } | Change::Remove { key } => key,
        }
    }
}

#[derive(Default)]
struct SharedState {
    items: Items,
    /// 키별 마지막 기록 세대
    written_at: HashMap<String, u64>,
    generation: u64,
}

/// 하나의 Fold 호출이 공유하는 결과 맵
pub struct SharedResult {
    strategy: MergeStrategy,
    state: Mutex<SharedState>,
}

impl SharedResult {
    pub fn new(seed: Items, strategy: MergeStrategy) -> Self {
        Self {
            strategy,
            state: Mutex::new(SharedState {
                items: seed,
                ..Default::default()
            }),
        }
    }

    /// 현재 상태의 사본
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.lock();
        Snapshot {
            items: state.items.clone(),
            generation: state.generation,
        }
    }

    /// 확장이 돌려준 맵을 `base` 스냅샷과 비교해서 차이만 반영
    ///
    /// `RejectOnConflict`이면 스냅샷 이후 다른 확장이 기록한 키를 건드릴 때 `MergeConflict`.
    /// null 값은 삭제로 취급한다.
    pub fn apply(&self, extension: &str, base: Snapshot, updated: Items) -> Result<MergeReport> {
        let Snapshot {
            items: mut previous,
            generation: base_generation,
        } = base;

        let mut changes = Vec::new();
        for (key, value) in updated {
            // previous에 남겨두면 아래에서 삭제로 처리된다
            if value.is_null() {
                continue;
            }
            match previous.remove(&key) {
                Some(old) if old == value => {}
                _ => changes.push(Change::Upsert { key, value }),
            }
        }
        // 반환된 맵에 없는 키는 확장이 지운 것
        changes.extend(previous.into_iter().map(|(key, _)| Change::Remove { key }));

        if changes.is_empty() {
            return Ok(MergeReport::default());
        }

        let mut state = self.state.lock();

        if self.strategy == MergeStrategy::RejectOnConflict {
            let conflict = changes.iter().find(|change| {
                state
                    .written_at
                    .get(change.key())
                    .is_some_and(|written| *written > base_generation)
            });
            if let Some(change) = conflict {
                return Err(Error::MergeConflict {
                    extension: extension.to_string(),
                    key: change.key().to_string(),
                });
            }
        }

        state.generation += 1;
        let generation = state.generation;
        let mut report = MergeReport::default();

        for change in changes {
            match change {
                Change::Upsert { key, value } => {
                    if state.items.insert(key.clone(), value).is_some() {
                        report.updated += 1;
                    } else {
                        report.added += 1;
                    }
                    state.written_at.insert(key, generation);
                }
                Change::Remove { key } => {
                    if state.items.remove(&key).is_some() {
                        report.removed += 1;
                    }
                    state.written_at.insert(key, generation);
                }
            }
        }

        Ok(report)
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.lock().items.get(key).cloned()
    }

    /// 현재 아이템 맵 복사
    pub fn to_items(&self) -> Items {
        self.state.lock().items.clone()
    }

    /// 공유 맵을 꺼내고 비운다
    pub fn take(&self) -> Items {
        let mut state = self.state.lock();
        state.written_at.clear();
        std::mem::take(&mut state.items)
    }
}

impl std::fmt::Debug for SharedResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SharedResult")
            .field("strategy", &self.strategy)
            .field("items", &state.items.len())
            .field("generation", &state.generation)
            .finish()
    }
}
