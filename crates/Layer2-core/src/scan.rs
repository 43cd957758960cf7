//! 선언 파일 검색 - 확장 매니페스트와 정적 아이템 파일 공용

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// 루트 디렉토리들을 재귀적으로 탐색해서 `suffix`로 끝나는 파일을 찾는다.
///
/// 존재하지 않는 루트는 건너뛴다. 결과는 경로 순으로 정렬된다.
pub(crate) async fn find_files_with_suffix(
    roots: &[PathBuf],
    suffix: &str,
) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending: Vec<PathBuf> = Vec::new();

    for root in roots {
        if fs::metadata(root).await.is_err() {
            debug!("Skipping missing search path {:?}", root);
            continue;
        }
        pending.push(root.clone());
    }

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;

            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() && has_suffix(&path, suffix) {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

/// 파일 이름에서 접미사를 뗀 부분
pub(crate) fn stem_without_suffix(path: &Path, suffix: &str) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    name.strip_suffix(suffix)
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.len() > suffix.len() && n.ends_with(suffix))
}
