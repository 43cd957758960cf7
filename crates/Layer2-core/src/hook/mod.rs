//! # Hook System
//!
//! 확장이 이름 붙은 훅을 구현하고, 런타임이 등록된 모든 확장에 대해 훅을 호출한다.
//!
//! ## 호출 방식
//!
//! - `fold`: 공유 아이템 맵을 확장들이 차례로(의존성 순서) 갱신
//! - `fan_out`: 확장마다 독립 값을 반환 (`init`)
//!
//! ## 순서
//!
//! 확장은 자신의 의존성 체인에 있는 모든 확장의 훅이 끝난 뒤에 실행된다.
//! 서로 관계없는 확장은 동시에 실행된다.
//!
//! ## 예시
//!
//! ```ignore
//! let table = HookTable::new()
//!     .with_fold("widget", |call| async move {
//!         let mut items = call.items;
//!         items.insert("x".into(), json!({"id": "x"}));
//!         Ok(items)
//!     });
//! ```

mod invoker;
mod merge;
mod types;

pub use invoker::{FoldRequest, HookInvoker, HookTarget};
pub use merge::{MergeReport, SharedResult, Snapshot};
pub use types::{
    FanOutCall, FanOutHook, FoldCall, FoldHook, HookCatalog, HookHandler, HookMode, HookTable,
    Items, COLLECT_HOOK, INIT_HOOK,
};
