use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, IoResultExt, Result};
use crate::index::IndexTransaction;
use crate::object::write_blob;
use crate::repo::{Repository, DATA_DIR};

/// stage files into the index
///
/// paths are relative to the working tree; a directory stages every
/// file beneath it (skipping the data directory). blobs are written to
/// the store and recorded under normalized forward-slash paths, all
/// within one index transaction.
pub fn add(repo: &Repository, paths: &[PathBuf]) -> Result<()> {
    let mut tx = IndexTransaction::begin(repo)?;

    for path in paths {
        let full = repo.work_dir().join(path);
        let meta = fs::metadata(&full).with_path(&full)?;

        if meta.is_dir() {
            add_directory(repo, &mut tx, &full)?;
        } else {
            add_file(repo, &mut tx, &full)?;
        }
    }

    tx.commit()
}

/// stage every file discovered under a directory
fn add_directory(repo: &Repository, tx: &mut IndexTransaction, dir: &Path) -> Result<()> {
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| Error::Io {
            path: dir.to_path_buf(),
            source: e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("walkdir error")),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(repo.work_dir())
            .unwrap_or(entry.path());
        if rel
            .components()
            .any(|c| matches!(c, Component::Normal(name) if name == DATA_DIR))
        {
            continue;
        }

        add_file(repo, tx, entry.path())?;
    }
    Ok(())
}

/// hash one file into the store and record it in the transaction
fn add_file(repo: &Repository, tx: &mut IndexTransaction, path: &Path) -> Result<()> {
    let content = fs::read(path).with_path(path)?;
    let id = write_blob(repo, &content)?;

    let rel = path.strip_prefix(repo.work_dir()).unwrap_or(path);
    let key = rel.to_string_lossy().replace('\\', "/");
    tx.entries_mut().insert(key, id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::load_index;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempdir().unwrap();
        let repo_path = dir.path().join("repo");
        let repo = Repository::init(&repo_path).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_add_single_file() {
        let (_dir, repo) = test_repo();

        fs::write(repo.work_dir().join("a.txt"), "hi\n").unwrap();
        add(&repo, &[PathBuf::from("a.txt")]).unwrap();

        let index = load_index(&repo).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(
            index["a.txt"].to_hex(),
            "45b983be36b73c0788dc9cbcb76cbb80fc7bb057"
        );
        // blob landed in the store
        assert!(crate::object::object_exists(&repo, &index["a.txt"]));
    }

    #[test]
    fn test_add_directory_recursive() {
        let (_dir, repo) = test_repo();

        fs::create_dir_all(repo.work_dir().join("src/nested")).unwrap();
        fs::write(repo.work_dir().join("src/main.txt"), "main").unwrap();
        fs::write(repo.work_dir().join("src/nested/lib.txt"), "lib").unwrap();

        add(&repo, &[PathBuf::from("src")]).unwrap();

        let index = load_index(&repo).unwrap();
        assert_eq!(index.len(), 2);
        assert!(index.contains_key("src/main.txt"));
        assert!(index.contains_key("src/nested/lib.txt"));
    }

    #[test]
    fn test_add_skips_data_dir() {
        let (_dir, repo) = test_repo();

        fs::write(repo.work_dir().join("a.txt"), "a").unwrap();
        add(&repo, &[PathBuf::from(".")]).unwrap();

        let index = load_index(&repo).unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.keys().all(|k| !k.contains(".ugit")));
    }

    #[test]
    fn test_add_accumulates() {
        let (_dir, repo) = test_repo();

        fs::write(repo.work_dir().join("one.txt"), "1").unwrap();
        add(&repo, &[PathBuf::from("one.txt")]).unwrap();

        fs::write(repo.work_dir().join("two.txt"), "2").unwrap();
        add(&repo, &[PathBuf::from("two.txt")]).unwrap();

        let index = load_index(&repo).unwrap();
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_add_missing_file_fails() {
        let (_dir, repo) = test_repo();

        let result = add(&repo, &[PathBuf::from("absent.txt")]);
        assert!(matches!(result, Err(Error::Io { .. })));

        // failed add leaves no index behind
        assert!(load_index(&repo).unwrap().is_empty());
    }
}
