//! Dependency Chain - 확장 하나의 실행 선행 목록

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 확장이 훅을 실행하기 전에 끝나야 하는 확장 목록
///
/// 공통 의존성 + 선언된 의존성 순서이며 중복과 자기 자신은 빠진다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyChain(Vec<String>);

impl DependencyChain {
    /// 체인 계산
    ///
    /// 확장 자신이 공통 의존성 목록에 있으면 목록에서 자기보다 앞에 있는 항목만 받는다.
    /// 공통 의존성끼리 서로를 기다리는 순환을 만들지 않기 위함이다.
    pub fn build(owner: &str, declared: &[String], common: &[String]) -> Self {
        let inherited = match common.iter().position(|c| c == owner) {
            Some(index) => &common[..index],
            None => common,
        };

        let mut seen = HashSet::new();
        let chain = inherited
            .iter()
            .chain(declared.iter())
            .map(String::as_str)
            .filter(|id| *id != owner)
            .filter(|id| seen.insert(*id))
            .map(str::to_string)
            .collect();

        Self(chain)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|c| c == id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl std::fmt::Display for DependencyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_common_first_then_declared() {
        let chain = DependencyChain::build("addon", &ids(&["base", "core"]), &ids(&["core"]));
        assert_eq!(chain.as_slice(), ids(&["core", "base"]).as_slice());
        assert_eq!(chain.to_string(), "[core, base]");
    }

    #[test]
    fn test_self_and_duplicates_removed() {
        let chain = DependencyChain::build("a", &ids(&["a", "b", "b"]), &[]);
        assert_eq!(chain.into_vec(), ids(&["b"]));
    }

    #[test]
    fn test_common_member_only_waits_for_earlier_commons() {
        let common = ids(&["core", "theme", "icons"]);
        assert!(DependencyChain::build("core", &[], &common).is_empty());
        assert_eq!(
            DependencyChain::build("theme", &[], &common).into_vec(),
            ids(&["core"])
        );
        assert_eq!(
            DependencyChain::build("plain", &[], &common).into_vec(),
            common
        );
    }
}
