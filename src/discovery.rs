//! 파일 탐색 모듈
//!
//! glob 패턴(`**` 재귀 포함)을 실제 일반 파일 목록으로 확장합니다.

use glob::{glob_with, MatchOptions};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CollectorError, Result};

/// 탐색에 쓰이는 매칭 옵션
///
/// `*`는 경로 구분자를 넘지 않고, 숨김 파일은 패턴에 점을 직접 적어야 매칭됩니다.
fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    }
}

/// 패턴과 일치하는 일반 파일 목록 반환
///
/// 심볼릭 링크와 폴더는 조용히 제외되고, 같은 경로는 한 번만 나옵니다.
/// 일치하는 파일이 없거나 패턴이 잘못된 경우 빈 목록을 반환합니다.
///
/// # Arguments
/// * `pattern` - 글로브 패턴 문자열 (예: `"runs/**/*_data.json"`)
pub fn find_data_files(pattern: &str) -> Vec<PathBuf> {
    log::debug!("Searching for files with pattern: {pattern}");

    match expand_pattern(pattern) {
        Ok(files) => files,
        Err(e) => {
            log::warn!("{e}");
            Vec::new()
        }
    }
}

fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries =
        glob_with(pattern, match_options()).map_err(|e| CollectorError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.msg.to_string(),
        })?;

    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                log::debug!("Skipping unreadable path {:?}: {}", e.path(), e.error());
                continue;
            }
        };

        if !is_regular_file(&path) || !seen.insert(path.clone()) {
            continue;
        }

        log::debug!("Found data file: {}", path.display());
        files.push(path);
    }

    Ok(files)
}

/// 링크를 따라가지 않고 일반 파일인지 확인
fn is_regular_file(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    #[test]
    fn test_recursive_pattern_matches_all_depths() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("root_data.json"));
        touch(&temp_dir.path().join("a/one_data.json"));
        touch(&temp_dir.path().join("a/b/two_data.json"));
        touch(&temp_dir.path().join("a/b/other.json"));

        let pattern = format!("{}/**/*_data.json", temp_dir.path().display());
        let files = find_data_files(&pattern);

        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|p| p.to_string_lossy().ends_with("_data.json")));
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("top_data.json"));
        touch(&temp_dir.path().join("nested/deep_data.json"));

        let pattern = format!("{}/*_data.json", temp_dir.path().display());
        let files = find_data_files(&pattern);

        assert_eq!(files, vec![temp_dir.path().join("top_data.json")]);
    }

    #[test]
    fn test_directories_are_excluded() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("dir_data.json")).unwrap();
        touch(&temp_dir.path().join("file_data.json"));

        let pattern = format!("{}/*_data.json", temp_dir.path().display());
        let files = find_data_files(&pattern);

        assert_eq!(files, vec![temp_dir.path().join("file_data.json")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_excluded() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("real_data.json");
        touch(&target);
        std::os::unix::fs::symlink(&target, temp_dir.path().join("link_data.json")).unwrap();

        let pattern = format!("{}/*_data.json", temp_dir.path().display());
        let files = find_data_files(&pattern);

        assert_eq!(files, vec![target]);
    }

    #[test]
    fn test_no_matches_is_empty() {
        let temp_dir = TempDir::new().unwrap();

        let pattern = format!("{}/**/*_data.json", temp_dir.path().display());
        assert!(find_data_files(&pattern).is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_empty() {
        assert!(find_data_files("[invalid").is_empty());
        assert!(matches!(
            expand_pattern("[invalid"),
            Err(CollectorError::InvalidPattern { .. })
        ));
    }
}
