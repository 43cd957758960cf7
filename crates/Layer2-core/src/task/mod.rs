//! Task System - 의존성 그래프 기반 동시 실행
//!
//! 훅 호출 한 번마다 [`TaskGraph`]를 만들고 [`DagExecutor`]로 실행한다.
//! - 선행 태스크가 모두 끝난 태스크만 시작
//! - 서로 독립인 태스크는 동시에 실행
//! - 첫 실패를 호출자에게 전달

mod executor;
mod graph;

pub use executor::DagExecutor;
pub use graph::{topological_order, TaskFn, TaskFuture, TaskGraph};
