use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

/// Every regular file below `root`, recursively, sorted by path.
///
/// A missing `root` yields an empty list.
pub(crate) async fn walk_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !fs::try_exists(root).await? {
        return Ok(files);
    }

    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn walks_nested_directories_in_order() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/c")).await.unwrap();
        fs::create_dir_all(dir.path().join("empty")).await.unwrap();
        fs::write(dir.path().join("b/c/2.jpg"), b"2").await.unwrap();
        fs::write(dir.path().join("a.csv"), b"a").await.unwrap();

        let files = walk_files(dir.path()).await.unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.csv"), dir.path().join("b/c/2.jpg")]
        );
    }

    #[tokio::test]
    async fn missing_root_is_empty() {
        let dir = tempdir().unwrap();
        let files = walk_files(&dir.path().join("nope")).await.unwrap();
        assert!(files.is_empty());
    }
}
