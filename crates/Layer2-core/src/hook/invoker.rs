//! Hook Invoker - 등록된 모든 확장에 대해 훅을 실행
//!
//! 호출마다 확장 하나당 태스크 하나인 그래프를 만들고, 확장의 의존성 체인을
//! 선행 태스크로 건다. 훅을 구현하지 않은 확장은 즉시 완료되는 태스크가 되어
//! 순서 제약만 전달한다.

use super::merge::SharedResult;
use super::types::{FanOutCall, FoldCall, HookHandler};
use crate::runtime::Runtime;
use crate::task::{DagExecutor, TaskGraph};
use prana_foundation::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 훅 호출 대상 확장 하나
#[derive(Debug, Clone)]
pub struct HookTarget {
    /// 확장 ID
    pub extension: String,
    /// 해결된 의존성 체인
    pub chain: Vec<String>,
    /// 훅 구현 (없으면 순서 제약만)
    pub handler: Option<HookHandler>,
}

/// Fold 호출 요청
pub struct FoldRequest {
    pub hook: String,
    pub category: String,
    pub shared: Arc<SharedResult>,
    pub args: Value,
}

impl FoldRequest {
    pub fn new(hook: impl Into<String>, category: impl Into<String>, shared: Arc<SharedResult>) -> Self {
        Self {
            hook: hook.into(),
            category: category.into(),
            shared,
            args: Value::Null,
        }
    }

    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }
}

/// 훅 실행기
#[derive(Debug, Clone, Default)]
pub struct HookInvoker {
    executor: DagExecutor,
}

impl HookInvoker {
    pub fn new(executor: DagExecutor) -> Self {
        Self { executor }
    }

    /// FanOut 호출 - 훅을 구현한 확장별 반환값
    ///
    /// 모든 확장의 훅이 끝나야 완료된다. 확장은 자신의 체인이 끝난 뒤에 시작한다.
    pub async fn fan_out(
        &self,
        runtime: &Runtime,
        targets: Vec<HookTarget>,
        hook: &str,
        args: Value,
    ) -> Result<HashMap<String, Value>> {
        let invocation = Uuid::new_v4();
        let implementers = targets.iter().filter(|t| t.handler.is_some()).count();
        info!(
            "[{}] Invoking fan-out hook '{}' ({} of {} extensions implement it)",
            invocation,
            hook,
            implementers,
            targets.len()
        );

        let mut graph: TaskGraph<Option<Value>> = TaskGraph::new();

        for target in targets {
            let handler = match target.handler {
                Some(HookHandler::FanOut(handler)) => Some(handler),
                Some(HookHandler::Fold(_)) => {
                    return Err(Error::HookModeMismatch {
                        extension: target.extension,
                        hook: hook.to_string(),
                        expected: "fan-out",
                    })
                }
                None => None,
            };

            let call = FanOutCall {
                runtime: runtime.clone(),
                extension: target.extension.clone(),
                hook: hook.to_string(),
                args: args.clone(),
            };

            graph.add_task(target.extension, target.chain, move || async move {
                let Some(handler) = handler else {
                    return Ok(None);
                };
                let extension = call.extension.clone();
                let hook = call.hook.clone();

                debug!("[{}] {} -> {}", invocation, extension, hook);
                handler(call)
                    .await
                    .map(Some)
                    .map_err(|e| Error::hook_failed(extension, hook, e))
            })?;
        }

        let results = self.executor.run(graph).await.inspect_err(|e| {
            warn!("[{}] Fan-out hook '{}' failed: {}", invocation, hook, e);
        })?;

        Ok(results
            .into_iter()
            .filter_map(|(id, value)| value.map(|v| (id, v)))
            .collect())
    }

    /// Fold 호출 - 각 확장의 기여를 공유 결과에 병합
    ///
    /// 반환 시점에 `request.shared`에는 모든 확장의 기여가 반영되어 있다.
    pub async fn fold(
        &self,
        runtime: &Runtime,
        targets: Vec<HookTarget>,
        request: FoldRequest,
    ) -> Result<()> {
        let invocation = Uuid::new_v4();
        let FoldRequest {
            hook,
            category,
            shared,
            args,
        } = request;

        info!(
            "[{}] Invoking fold hook '{}' for category '{}' across {} extensions",
            invocation,
            hook,
            category,
            targets.len()
        );

        let mut graph: TaskGraph<()> = TaskGraph::new();

        for target in targets {
            let handler = match target.handler {
                Some(HookHandler::Fold(handler)) => Some(handler),
                Some(HookHandler::FanOut(_)) => {
                    return Err(Error::HookModeMismatch {
                        extension: target.extension,
                        hook,
                        expected: "fold",
                    })
                }
                None => None,
            };

            let runtime = runtime.clone();
            let extension = target.extension.clone();
            let hook = hook.clone();
            let category = category.clone();
            let shared = Arc::clone(&shared);
            let args = args.clone();

            graph.add_task(target.extension, target.chain, move || async move {
                let Some(handler) = handler else {
                    return Ok(());
                };

                let base = shared.snapshot();
                let call = FoldCall {
                    runtime,
                    extension: extension.clone(),
                    hook: hook.clone(),
                    category,
                    items: base.items.clone(),
                    args,
                };

                let updated = handler(call)
                    .await
                    .map_err(|e| Error::hook_failed(&extension, &hook, e))?;
                let report = shared.apply(&extension, base, updated)?;

                debug!(
                    "[{}] {} -> {}: +{} ~{} -{}",
                    invocation, extension, hook, report.added, report.updated, report.removed
                );
                Ok(())
            })?;
        }

        self.executor.run(graph).await.map(|_| ()).inspect_err(|e| {
            warn!("[{}] Fold hook '{}' failed: {}", invocation, hook, e);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::types::Items;
    use parking_lot::Mutex;
    use prana_foundation::MergeStrategy;
    use serde_json::json;

    fn target(id: &str, chain: &[&str], handler: Option<HookHandler>) -> HookTarget {
        HookTarget {
            extension: id.to_string(),
            chain: chain.iter().map(|s| s.to_string()).collect(),
            handler,
        }
    }

    #[tokio::test]
    async fn test_fan_out_collects_implementers() {
        let runtime = Runtime::new();
        let targets = vec![
            target(
                "a",
                &[],
                Some(HookHandler::fan_out(|call| async move { Ok(json!(call.extension)) })),
            ),
            target("b", &["a"], None),
        ];

        let results = HookInvoker::default()
            .fan_out(&runtime, targets, "init", Value::Null)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results["a"], json!("a"));
    }

    #[tokio::test]
    async fn test_data_only_extension_preserves_order() {
        let runtime = Runtime::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let record = |name: &'static str, log: Arc<Mutex<Vec<&'static str>>>| {
            HookHandler::fan_out(move |_call| {
                let log = Arc::clone(&log);
                async move {
                    tokio::time::sleep(std::time::Duration::from_millis(
                        if name == "first" { 30 } else { 0 },
                    ))
                    .await;
                    log.lock().push(name);
                    Ok(Value::Null)
                }
            })
        };

        let targets = vec![
            target("first", &[], Some(record("first", Arc::clone(&log)))),
            target("middle", &["first"], None),
            target("last", &["middle"], Some(record("last", Arc::clone(&log)))),
        ];

        HookInvoker::default()
            .fan_out(&runtime, targets, "ping", Value::Null)
            .await
            .unwrap();

        assert_eq!(*log.lock(), vec!["first", "last"]);
    }

    #[tokio::test]
    async fn test_mode_mismatch_runs_nothing() {
        let runtime = Runtime::new();
        let called = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&called);

        let targets = vec![
            target(
                "ok",
                &[],
                Some(HookHandler::fan_out(move |_call| {
                    let flag = Arc::clone(&flag);
                    async move {
                        *flag.lock() = true;
                        Ok(Value::Null)
                    }
                })),
            ),
            target(
                "wrong",
                &[],
                Some(HookHandler::fold(|call| async move { Ok(call.items) })),
            ),
        ];

        let err = HookInvoker::default()
            .fan_out(&runtime, targets, "init", Value::Null)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::HookModeMismatch { ref extension, .. } if extension == "wrong"));
        assert!(!*called.lock());
    }

    #[tokio::test]
    async fn test_fold_chain_sees_prerequisite_items() {
        let runtime = Runtime::new();
        let shared = Arc::new(SharedResult::new(Items::new(), MergeStrategy::Overwrite));

        let targets = vec![
            target(
                "addon",
                &["base"],
                Some(HookHandler::fold(|call| async move {
                    let mut items = call.items;
                    if let Some(Value::Object(x)) = items.get_mut("x") {
                        x.insert("v".into(), json!(2));
                    }
                    Ok(items)
                })),
            ),
            target(
                "base",
                &[],
                Some(HookHandler::fold(|call| async move {
                    let mut items = call.items;
                    items.insert("x".into(), json!({"id": "x", "v": 1}));
                    Ok(items)
                })),
            ),
        ];

        HookInvoker::default()
            .fold(&runtime, targets, FoldRequest::new("widget", "widget", Arc::clone(&shared)))
            .await
            .unwrap();

        assert_eq!(shared.get("x"), Some(json!({"id": "x", "v": 2})));
    }

    #[tokio::test]
    async fn test_fold_error_names_extension() {
        let runtime = Runtime::new();
        let shared = Arc::new(SharedResult::new(Items::new(), MergeStrategy::Overwrite));
        let targets = vec![target(
            "broken",
            &[],
            Some(HookHandler::fold(|_call| async { Err(Error::from("boom")) })),
        )];

        let err = HookInvoker::default()
            .fold(&runtime, targets, FoldRequest::new("widget", "widget", shared))
            .await
            .unwrap_err();

        assert_eq!(err.extension(), Some("broken"));
        assert!(matches!(err, Error::HookFailed { .. }));
    }
}
