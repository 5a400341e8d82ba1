use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{AppError, Result};
use crate::job::CompleteResult;

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9a-zA-Z]+").expect("Failed to compile filename pattern"));

/// Turns a URL into a file stem: every run of non-alphanumeric characters becomes `_`.
pub fn sanitize_filename(url: &str) -> String {
    NON_ALPHANUMERIC.replace_all(url, "_").into_owned()
}

pub fn result_path(dir: &Path, url: &str) -> PathBuf {
    dir.join(format!("{}.json", sanitize_filename(url)))
}

/// Writes `result` as pretty JSON under `dir`, creating the directory if needed.
pub async fn save_result(dir: &Path, url: &str, result: &CompleteResult) -> Result<PathBuf> {
    let path = result_path(dir, url);
    let json = serde_json::to_vec_pretty(result)
        .map_err(|e| AppError::StorageError(format!("Failed to serialize result: {}", e)))?;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::StorageError(format!("{}: {}", dir.display(), e)))?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|e| AppError::StorageError(format!("{}: {}", path.display(), e)))?;

    info!(path = %path.display(), "saved result");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_runs_of_separators() {
        assert_eq!(
            sanitize_filename("https://example.com/a/b?q=1"),
            "https_example_com_a_b_q_1"
        );
        assert_eq!(sanitize_filename("abc123"), "abc123");
        assert_eq!(sanitize_filename("://"), "_");
    }

    #[test]
    fn path_lives_in_output_dir() {
        let path = result_path(Path::new("out"), "http://x.y/");
        assert_eq!(path, Path::new("out").join("http_x_y_.json"));
    }
}
