//! Local directory sizing
//!
//! Recursively sums regular-file sizes under a directory. The strict walk
//! fails on the first unreadable entry; the lenient walk counts whatever is
//! readable and backs uncached fallback answers. Both run on the blocking
//! pool so a deep tree never stalls the runtime.

use std::io;
use std::path::Path;

use tokio::task;
use walkdir::WalkDir;

use super::ProbeError;

/// Total size in bytes of all regular files under `path`
///
/// Any unreadable entry fails the whole probe. Symlinks are not followed
/// and do not count toward the total.
pub async fn directory_size(path: &Path) -> Result<u64, ProbeError> {
    let root = path.to_path_buf();
    task::spawn_blocking(move || walk_strict(&root))
        .await
        .map_err(|e| ProbeError::Traversal {
            path: path.display().to_string(),
            source: io::Error::new(io::ErrorKind::Other, e),
        })?
}

/// Best-effort variant of [`directory_size`] that skips unreadable entries
pub async fn directory_size_lenient(path: &Path) -> u64 {
    let root = path.to_path_buf();
    task::spawn_blocking(move || walk_lenient(&root))
        .await
        .unwrap_or(0)
}

fn walk_strict(root: &Path) -> Result<u64, ProbeError> {
    let mut total = 0u64;
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| traversal_error(root, e))?;
        if entry.file_type().is_file() {
            let meta = entry.metadata().map_err(|e| traversal_error(root, e))?;
            total += meta.len();
        }
    }
    Ok(total)
}

fn walk_lenient(root: &Path) -> u64 {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum()
}

fn traversal_error(root: &Path, err: walkdir::Error) -> ProbeError {
    let path = err
        .path()
        .unwrap_or(root)
        .display()
        .to_string();
    ProbeError::Traversal {
        path,
        source: io::Error::from(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_directory_size_sums_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.bin"), vec![0u8; 1024]).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("b.bin"), vec![0u8; 512]).unwrap();

        let total = directory_size(dir.path()).await.unwrap();
        assert_eq!(total, 1536);
    }

    #[tokio::test]
    async fn test_directory_size_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let total = directory_size(dir.path()).await.unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_directory_size_missing_path_fails() {
        let result = directory_size(Path::new("/definitely/not/a/real/path")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_lenient_walk_missing_path_is_zero() {
        let total = directory_size_lenient(Path::new("/definitely/not/a/real/path")).await;
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_lenient_walk_matches_strict_on_readable_tree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.bin"), vec![0u8; 300]).unwrap();

        let strict = directory_size(dir.path()).await.unwrap();
        let lenient = directory_size_lenient(dir.path()).await;
        assert_eq!(strict, lenient);
        assert_eq!(strict, 300);
    }
}
