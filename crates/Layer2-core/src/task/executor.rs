//! Dependency-aware task execution
//!
//! Runs every task of a [`TaskGraph`] as soon as all of its prerequisites
//! have completed. Independent tasks run concurrently on the tokio runtime.
//!
//! ## Failure handling
//!
//! The first task error (or panic) is returned to the caller. Once a failure
//! is seen no further task is started, tasks already running are drained and
//! their results discarded.
//!
//! ## Example
//!
//! ```ignore
//! let mut graph = TaskGraph::new();
//! graph.add_task("a", vec![], || async { Ok(1) })?;
//! graph.add_task("b", vec!["a".into()], || async { Ok(2) })?;
//!
//! let results = DagExecutor::new().run(graph).await?;
//! assert_eq!(results["b"], 2);
//! ```

use super::graph::{TaskFn, TaskGraph};
use futures::FutureExt;
use prana_foundation::{Error, Result};
use std::collections::{HashMap, HashSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Executes task graphs with optional concurrency limit
#[derive(Debug, Clone, Default)]
pub struct DagExecutor {
    /// Maximum concurrent tasks (None = unbounded)
    max_concurrent: Option<usize>,
    /// Semaphore for limiting concurrency
    semaphore: Option<Arc<Semaphore>>,
}

impl DagExecutor {
    /// Create an executor without a concurrency limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor running at most `max_concurrent` tasks at once
    pub fn with_max_concurrency(max_concurrent: usize) -> Self {
        let limit = max_concurrent.max(1);
        Self {
            max_concurrent: Some(limit),
            semaphore: Some(Arc::new(Semaphore::new(limit))),
        }
    }

    /// Executor matching an optional configured limit
    pub fn from_limit(limit: Option<usize>) -> Self {
        match limit {
            Some(n) => Self::with_max_concurrency(n),
            None => Self::new(),
        }
    }

    /// Get the concurrency limit
    pub fn max_concurrent(&self) -> Option<usize> {
        self.max_concurrent
    }

    /// Run every task of the graph
    ///
    /// The graph is validated first, so unknown prerequisites and cycles are
    /// reported before any task starts. The returned map holds one result per
    /// task identifier.
    pub async fn run<T: Send + 'static>(&self, graph: TaskGraph<T>) -> Result<HashMap<String, T>> {
        if graph.is_empty() {
            return Ok(HashMap::new());
        }

        let order = graph.validate()?;
        let total = order.len();

        let mut remaining: HashMap<String, usize> = HashMap::with_capacity(total);
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        let mut pending: HashMap<String, TaskFn<T>> = HashMap::with_capacity(total);

        for (id, node) in graph.into_nodes() {
            let unique: HashSet<String> = node.prerequisites.into_iter().collect();
            for prerequisite in &unique {
                dependents
                    .entry(prerequisite.clone())
                    .or_default()
                    .push(id.clone());
            }
            remaining.insert(id.clone(), unique.len());
            pending.insert(id, node.run);
        }

        let mut ready: VecDeque<String> = order
            .into_iter()
            .filter(|id| remaining.get(id) == Some(&0))
            .collect();

        debug!(
            "Running {} tasks ({} initially ready, limit: {:?})",
            total,
            ready.len(),
            self.max_concurrent
        );

        let halted = Arc::new(AtomicBool::new(false));
        let mut running: JoinSet<(String, Result<T>)> = JoinSet::new();
        let mut results: HashMap<String, T> = HashMap::with_capacity(total);
        let mut failure: Option<Error> = None;

        loop {
            if failure.is_none() {
                while let Some(id) = ready.pop_front() {
                    if let Some(run) = pending.remove(&id) {
                        self.spawn(&mut running, &halted, id, run);
                    }
                }
            }

            let Some(joined) = running.join_next().await else {
                break;
            };

            match joined {
                Ok((id, Ok(value))) => {
                    if failure.is_some() {
                        debug!("Discarding result of task {} after failure", id);
                        continue;
                    }
                    for child in dependents.get(&id).into_iter().flatten() {
                        if let Some(count) = remaining.get_mut(child) {
                            *count -= 1;
                            if *count == 0 {
                                ready.push_back(child.clone());
                            }
                        }
                    }
                    results.insert(id, value);
                }
                Ok((id, Err(e))) => {
                    let replaces = match &failure {
                        None => true,
                        // 취소는 원래 실패를 가리지 않는다
                        Some(Error::Cancelled(_)) => !matches!(e, Error::Cancelled(_)),
                        Some(_) => false,
                    };
                    if replaces {
                        warn!("Task {} failed: {}", id, e);
                        halted.store(true, Ordering::SeqCst);
                        failure = Some(e);
                    } else {
                        debug!("Ignoring error of task {} after failure: {}", id, e);
                    }
                }
                Err(e) => {
                    warn!("Task join failed: {}", e);
                    if failure.is_none() {
                        halted.store(true, Ordering::SeqCst);
                        failure = Some(Error::Internal(format!("Task join failed: {}", e)));
                    }
                }
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }

        if results.len() != total {
            return Err(Error::Internal(format!(
                "{} of {} tasks never became ready",
                total - results.len(),
                total
            )));
        }

        Ok(results)
    }

    fn spawn<T: Send + 'static>(
        &self,
        running: &mut JoinSet<(String, Result<T>)>,
        halted: &Arc<AtomicBool>,
        id: String,
        run: TaskFn<T>,
    ) {
        let semaphore = self.semaphore.clone();
        let halted = Arc::clone(halted);

        running.spawn(async move {
            let _permit = match semaphore {
                Some(semaphore) => match semaphore.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => return (id.clone(), Err(Error::Cancelled(id))),
                },
                None => None,
            };

            // 대기 중에 다른 태스크가 실패했으면 시작하지 않는다
            if halted.load(Ordering::SeqCst) {
                return (id.clone(), Err(Error::Cancelled(id)));
            }

            debug!("Starting task {}", id);
            let result = match AssertUnwindSafe(run()).catch_unwind().await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Task panicked: {}", id);
                    Err(Error::TaskPanicked(id.clone()))
                }
            };

            // 허가를 놓기 전에 멈춤 표시를 해야 대기 중인 태스크가 시작하지 않는다
            if result.is_err() {
                halted.store(true, Ordering::SeqCst);
            }
            (id, result)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn explode() -> Result<()> {
        panic!("kaboom")
    }

    #[tokio::test]
    async fn test_empty_graph() {
        let results = DagExecutor::new().run(TaskGraph::<()>::new()).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_prerequisites_finish_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut graph = TaskGraph::new();

        for (id, prereqs, delay) in [
            ("c", ids(&["a", "b"]), 0),
            ("a", vec![], 30),
            ("b", ids(&["a"]), 10),
        ] {
            let log = Arc::clone(&log);
            graph
                .add_task(id, prereqs, move || async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    log.lock().push(id);
                    Ok(id.len())
                })
                .unwrap();
        }

        let results = DagExecutor::new().run(graph).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(*log.lock(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_independent_tasks_overlap() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut graph = TaskGraph::new();

        for id in ["a", "b", "c"] {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            graph
                .add_task(id, vec![], move || async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .unwrap();
        }

        DagExecutor::new().run(graph).await.unwrap();
        assert!(peak.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_concurrency_limit() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut graph = TaskGraph::new();

        for id in ["a", "b", "c", "d"] {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            graph
                .add_task(id, vec![], move || async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .unwrap();
        }

        let executor = DagExecutor::with_max_concurrency(1);
        assert_eq!(executor.max_concurrent(), Some(1));
        executor.run(graph).await.unwrap();
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_skips_dependents() {
        let started = Arc::new(AtomicBool::new(false));
        let mut graph: TaskGraph<()> = TaskGraph::new();

        graph
            .add_task("broken", vec![], || async { Err(Error::from("boom")) })
            .unwrap();
        let flag = Arc::clone(&started);
        graph
            .add_task("after", ids(&["broken"]), move || async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        let err = DagExecutor::new().run(graph).await.unwrap_err();
        assert!(matches!(err, Error::Internal(msg) if msg == "boom"));
        assert!(!started.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_failure_cancels_tasks_waiting_for_permit() {
        let started = Arc::new(AtomicUsize::new(0));
        let mut graph: TaskGraph<()> = TaskGraph::new();

        // 먼저 허가를 얻은 태스크가 실패하고, 나머지는 허가를 기다리는 중이다
        for id in ["left", "right", "third"] {
            let started = Arc::clone(&started);
            graph
                .add_task(id, vec![], move || async move {
                    if started.fetch_add(1, Ordering::SeqCst) == 0 {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        return Err(Error::from("first failure"));
                    }
                    Ok(())
                })
                .unwrap();
        }

        let err = DagExecutor::with_max_concurrency(1)
            .run(graph)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Internal(msg) if msg == "first failure"));
        assert_eq!(started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cycle_runs_nothing() {
        let started = Arc::new(AtomicUsize::new(0));
        let mut graph: TaskGraph<()> = TaskGraph::new();

        for (id, prereq) in [("a", "b"), ("b", "a")] {
            let started = Arc::clone(&started);
            graph
                .add_task(id, ids(&[prereq]), move || async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .unwrap();
        }

        let err = DagExecutor::new().run(graph).await.unwrap_err();
        assert!(matches!(err, Error::DependencyCycle(_)));
        assert_eq!(started.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panic_becomes_error() {
        let mut graph: TaskGraph<()> = TaskGraph::new();
        graph
            .add_task("explodes", vec![], || async { explode() })
            .unwrap();

        let err = DagExecutor::new().run(graph).await.unwrap_err();
        assert!(matches!(err, Error::TaskPanicked(id) if id == "explodes"));
    }
}
