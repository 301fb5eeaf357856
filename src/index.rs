use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use crate::error::{Error, IoResultExt, Result};
use crate::hash::ObjectId;
use crate::repo::Repository;

/// the staging map: relative forward-slash path to blob id
pub type IndexEntries = BTreeMap<String, ObjectId>;

/// read the index without acquiring it; empty when the file is missing
pub fn load_index(repo: &Repository) -> Result<IndexEntries> {
    let path = repo.index_path();
    let content = match fs::read(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(IndexEntries::new()),
        Err(e) => return Err(Error::Io { path, source: e }),
    };

    let entries: IndexEntries = serde_json::from_slice(&content)?;
    Ok(entries)
}

/// is the index in use (i.e. has it ever been written)
pub fn index_in_use(repo: &Repository) -> bool {
    repo.index_path().is_file()
}

// registry of data directories with an active transaction; the scoped
// acquisition is exclusive per repository
fn active() -> &'static Mutex<HashSet<PathBuf>> {
    static ACTIVE: OnceLock<Mutex<HashSet<PathBuf>>> = OnceLock::new();
    ACTIVE.get_or_init(|| Mutex::new(HashSet::new()))
}

/// scoped, exclusive acquisition of the index
///
/// `begin` loads the current entries; mutations happen on the returned
/// transaction; `commit` persists them atomically. dropping without
/// commit discards all changes. a second acquisition for the same
/// repository while one is active fails with `Busy`.
pub struct IndexTransaction<'r> {
    repo: &'r Repository,
    key: PathBuf,
    entries: IndexEntries,
}

impl<'r> IndexTransaction<'r> {
    /// begin a transaction, failing with `Busy` when one is active
    pub fn begin(repo: &'r Repository) -> Result<Self> {
        let key = repo
            .git_dir()
            .canonicalize()
            .with_path(repo.git_dir())?;

        {
            let mut active = active().lock().expect("index registry poisoned");
            if !active.insert(key.clone()) {
                return Err(Error::Busy);
            }
        }

        let entries = match load_index(repo) {
            Ok(entries) => entries,
            Err(e) => {
                active().lock().expect("index registry poisoned").remove(&key);
                return Err(e);
            }
        };

        Ok(Self { repo, key, entries })
    }

    /// current entries
    pub fn entries(&self) -> &IndexEntries {
        &self.entries
    }

    /// mutable view of the entries
    pub fn entries_mut(&mut self) -> &mut IndexEntries {
        &mut self.entries
    }

    /// discard current entries and stage `entries` instead
    pub fn replace(&mut self, entries: IndexEntries) {
        self.entries = entries;
    }

    /// persist the entries atomically and release the acquisition
    pub fn commit(self) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.entries)?;

        let tmp_path = self.repo.tmp_path().join(uuid::Uuid::new_v4().to_string());
        {
            let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
            tmp_file.write_all(&json).with_path(&tmp_path)?;
            tmp_file.sync_all().with_path(&tmp_path)?;
        }
        fs::rename(&tmp_path, self.repo.index_path()).with_path(self.repo.index_path())?;

        Ok(())
        // drop releases the registry entry
    }
}

impl Drop for IndexTransaction<'_> {
    fn drop(&mut self) {
        active()
            .lock()
            .expect("index registry poisoned")
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempdir().unwrap();
        let repo_path = dir.path().join("repo");
        let repo = Repository::init(&repo_path).unwrap();
        (dir, repo)
    }

    fn oid(n: u8) -> ObjectId {
        ObjectId::from_bytes([n; 20])
    }

    #[test]
    fn test_load_missing_index_is_empty() {
        let (_dir, repo) = test_repo();

        assert!(!index_in_use(&repo));
        assert!(load_index(&repo).unwrap().is_empty());
    }

    #[test]
    fn test_transaction_commit_persists() {
        let (_dir, repo) = test_repo();

        let mut tx = IndexTransaction::begin(&repo).unwrap();
        tx.entries_mut().insert("a.txt".to_string(), oid(1));
        tx.entries_mut().insert("dir/b.txt".to_string(), oid(2));
        tx.commit().unwrap();

        assert!(index_in_use(&repo));
        let loaded = load_index(&repo).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded["a.txt"], oid(1));
        assert_eq!(loaded["dir/b.txt"], oid(2));
    }

    #[test]
    fn test_transaction_drop_discards() {
        let (_dir, repo) = test_repo();

        {
            let mut tx = IndexTransaction::begin(&repo).unwrap();
            tx.entries_mut().insert("a.txt".to_string(), oid(1));
            // dropped without commit
        }

        assert!(load_index(&repo).unwrap().is_empty());
    }

    #[test]
    fn test_nested_acquisition_is_busy() {
        let (_dir, repo) = test_repo();

        let _tx = IndexTransaction::begin(&repo).unwrap();
        let result = IndexTransaction::begin(&repo);
        assert!(matches!(result, Err(Error::Busy)));
    }

    #[test]
    fn test_acquisition_released_after_drop() {
        let (_dir, repo) = test_repo();

        {
            let _tx = IndexTransaction::begin(&repo).unwrap();
        }
        // no longer busy
        let _tx = IndexTransaction::begin(&repo).unwrap();
    }

    #[test]
    fn test_acquisitions_on_different_repos_are_independent() {
        let (_dir1, repo1) = test_repo();
        let (_dir2, repo2) = test_repo();

        let _tx1 = IndexTransaction::begin(&repo1).unwrap();
        let _tx2 = IndexTransaction::begin(&repo2).unwrap();
    }

    #[test]
    fn test_index_is_json_object() {
        let (_dir, repo) = test_repo();

        let mut tx = IndexTransaction::begin(&repo).unwrap();
        tx.entries_mut().insert("a.txt".to_string(), oid(1));
        tx.commit().unwrap();

        let raw = fs::read_to_string(repo.index_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value["a.txt"],
            serde_json::Value::String(oid(1).to_hex())
        );
    }

    #[test]
    fn test_replace() {
        let (_dir, repo) = test_repo();

        let mut tx = IndexTransaction::begin(&repo).unwrap();
        tx.entries_mut().insert("old.txt".to_string(), oid(1));
        tx.commit().unwrap();

        let mut tx = IndexTransaction::begin(&repo).unwrap();
        let mut fresh = IndexEntries::new();
        fresh.insert("new.txt".to_string(), oid(2));
        tx.replace(fresh);
        tx.commit().unwrap();

        let loaded = load_index(&repo).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key("new.txt"));
    }
}
