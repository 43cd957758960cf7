//! Task Graph - 호출마다 새로 만드는 일회성 의존성 그래프
//!
//! 각 태스크는 ID, 선행 태스크 목록, 그리고 한 번만 실행되는 비동기 함수로 구성된다.
//! 그래프는 실행 전에 [`TaskGraph::validate`]로 검증된다.

use futures::future::BoxFuture;
use futures::FutureExt;
use prana_foundation::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::future::Future;

/// 태스크가 반환하는 퓨처
pub type TaskFuture<T> = BoxFuture<'static, Result<T>>;

/// 한 번만 호출되는 태스크 함수
pub type TaskFn<T> = Box<dyn FnOnce() -> TaskFuture<T> + Send>;

pub(crate) struct TaskNode<T> {
    pub(crate) prerequisites: Vec<String>,
    pub(crate) run: TaskFn<T>,
}

/// 의존성 그래프
pub struct TaskGraph<T> {
    nodes: HashMap<String, TaskNode<T>>,
}

impl<T> Default for TaskGraph<T> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }
}

impl<T> TaskGraph<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 태스크 추가
    ///
    /// 같은 ID가 이미 있으면 `DuplicateTask`. 선행 태스크는 실행 전 검증 단계에서 확인한다.
    pub fn add_task<F, Fut>(
        &mut self,
        id: impl Into<String>,
        prerequisites: Vec<String>,
        run: F,
    ) -> Result<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(Error::DuplicateTask(id));
        }

        self.nodes.insert(
            id,
            TaskNode {
                prerequisites,
                run: Box::new(move || run().boxed()),
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn prerequisites(&self, id: &str) -> Option<&[String]> {
        self.nodes.get(id).map(|n| n.prerequisites.as_slice())
    }

    /// 그래프 검증 후 위상 순서 반환
    pub fn validate(&self) -> Result<Vec<String>> {
        topological_order(
            self.nodes
                .iter()
                .map(|(id, node)| (id.as_str(), node.prerequisites.as_slice())),
        )
    }

    pub(crate) fn into_nodes(self) -> HashMap<String, TaskNode<T>> {
        self.nodes
    }
}

impl<T> std::fmt::Debug for TaskGraph<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let edges: BTreeMap<&str, &[String]> = self
            .nodes
            .iter()
            .map(|(id, n)| (id.as_str(), n.prerequisites.as_slice()))
            .collect();
        f.debug_struct("TaskGraph").field("tasks", &edges).finish()
    }
}

// ============================================================================
// Topological order (Kahn)
// ============================================================================

/// `(태스크, 선행 태스크들)` 목록의 위상 순서
///
/// - 알 수 없는 선행 태스크 → `UnresolvedReference`
/// - 순환 → `DependencyCycle` (진행하지 못한 태스크 목록, 정렬됨)
///
/// 같은 단계의 태스크는 ID 순으로 나온다.
pub fn topological_order<'a, I>(edges: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = (&'a str, &'a [String])>,
{
    let edges: BTreeMap<&str, &[String]> = edges.into_iter().collect();

    for (task, prerequisites) in &edges {
        if let Some(missing) = prerequisites
            .iter()
            .find(|p| !edges.contains_key(p.as_str()))
        {
            return Err(Error::UnresolvedReference {
                task: task.to_string(),
                prerequisite: missing.clone(),
            });
        }
    }

    let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for (task, prerequisites) in &edges {
        let unique: BTreeSet<&str> = prerequisites.iter().map(String::as_str).collect();
        in_degree.insert(task, unique.len());
        for prerequisite in unique {
            dependents.entry(prerequisite).or_default().push(task);
        }
    }

    let mut ready: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut order = Vec::with_capacity(edges.len());

    while let Some(id) = ready.pop_front() {
        order.push(id.to_string());
        for dependent in dependents.get(id).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.push_back(dependent);
                }
            }
        }
    }

    if order.len() < edges.len() {
        let stuck = in_degree
            .into_iter()
            .filter(|(_, degree)| *degree > 0)
            .map(|(id, _)| id.to_string())
            .collect();
        return Err(Error::DependencyCycle(stuck));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn noop_graph(edges: &[(&str, &[&str])]) -> TaskGraph<()> {
        let mut graph = TaskGraph::new();
        for (id, prereqs) in edges {
            graph.add_task(*id, deps(prereqs), || async { Ok(()) }).unwrap();
        }
        graph
    }

    #[test]
    fn test_order_respects_prerequisites() {
        let graph = noop_graph(&[("c", &["a", "b"]), ("b", &["a"]), ("a", &[])]);
        assert_eq!(graph.validate().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_task_rejected() {
        let mut graph = noop_graph(&[("a", &[])]);
        let err = graph.add_task("a", vec![], || async { Ok(()) }).unwrap_err();
        assert!(matches!(err, Error::DuplicateTask(id) if id == "a"));
    }

    #[test]
    fn test_unresolved_reference() {
        let graph = noop_graph(&[("a", &["ghost"])]);
        match graph.validate().unwrap_err() {
            Error::UnresolvedReference { task, prerequisite } => {
                assert_eq!(task, "a");
                assert_eq!(prerequisite, "ghost");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cycle_lists_stuck_tasks() {
        let graph = noop_graph(&[("a", &["b"]), ("b", &["a"]), ("c", &[])]);
        match graph.validate().unwrap_err() {
            Error::DependencyCycle(ids) => assert_eq!(ids, vec!["a", "b"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let graph = noop_graph(&[("a", &["a"])]);
        assert!(matches!(graph.validate(), Err(Error::DependencyCycle(_))));
    }

    #[test]
    fn test_repeated_prerequisite_counts_once() {
        let graph = noop_graph(&[("a", &[]), ("b", &["a", "a"])]);
        assert_eq!(graph.validate().unwrap(), vec!["a", "b"]);
    }
}
