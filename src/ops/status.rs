use std::collections::BTreeMap;

use crate::diff::{changed_files, ChangeKind};
use crate::error::Result;
use crate::hash::ObjectId;
use crate::object::read_commit;
use crate::ops::branch_name;
use crate::refs;
use crate::repo::Repository;
use crate::worktree::{flatten, worktree_snapshot};

/// where HEAD points and what differs from it
#[derive(Debug, Clone)]
pub struct Status {
    /// current branch; `None` when detached
    pub branch: Option<String>,
    /// current commit; `None` before the first commit
    pub head: Option<ObjectId>,
    /// paths in the working tree that differ from HEAD's snapshot
    pub changes: Vec<(String, ChangeKind)>,
}

/// report the current branch and working-tree changes against HEAD
pub fn status(repo: &Repository) -> Result<Status> {
    let branch = branch_name(repo)?;
    let head = match refs::get_ref(repo, refs::HEAD, true)? {
        Some(value) => Some(value.id()?),
        None => None,
    };

    let head_tree = match head {
        Some(id) => flatten(repo, &read_commit(repo, &id)?.tree)?,
        None => BTreeMap::new(),
    };
    let working = worktree_snapshot(repo)?;

    Ok(Status {
        branch,
        head,
        changes: changed_files(&head_tree, &working),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{add, create_commit};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempdir().unwrap();
        let repo_path = dir.path().join("repo");
        let repo = Repository::init(&repo_path).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_status_fresh_repo() {
        let (_dir, repo) = test_repo();

        let s = status(&repo).unwrap();
        assert_eq!(s.branch, Some("master".to_string()));
        assert_eq!(s.head, None);
        assert!(s.changes.is_empty());
    }

    #[test]
    fn test_status_clean_after_commit() {
        let (_dir, repo) = test_repo();

        fs::write(repo.work_dir().join("a.txt"), "hi\n").unwrap();
        add(&repo, &[PathBuf::from("a.txt")]).unwrap();
        let c1 = create_commit(&repo, "first").unwrap();

        let s = status(&repo).unwrap();
        assert_eq!(s.head, Some(c1));
        assert!(s.changes.is_empty());
    }

    #[test]
    fn test_status_reports_changes() {
        let (_dir, repo) = test_repo();

        fs::write(repo.work_dir().join("keep.txt"), "same").unwrap();
        fs::write(repo.work_dir().join("edit.txt"), "before").unwrap();
        fs::write(repo.work_dir().join("gone.txt"), "bye").unwrap();
        add(&repo, &[PathBuf::from(".")]).unwrap();
        create_commit(&repo, "base").unwrap();

        fs::write(repo.work_dir().join("edit.txt"), "after").unwrap();
        fs::remove_file(repo.work_dir().join("gone.txt")).unwrap();
        fs::write(repo.work_dir().join("fresh.txt"), "new").unwrap();

        let s = status(&repo).unwrap();
        assert_eq!(
            s.changes,
            vec![
                ("edit.txt".to_string(), ChangeKind::Modified),
                ("fresh.txt".to_string(), ChangeKind::New),
                ("gone.txt".to_string(), ChangeKind::Deleted),
            ]
        );
    }

    #[test]
    fn test_status_detached() {
        let (_dir, repo) = test_repo();

        fs::write(repo.work_dir().join("a.txt"), "v1").unwrap();
        add(&repo, &[PathBuf::from("a.txt")]).unwrap();
        let c1 = create_commit(&repo, "first").unwrap();

        crate::ops::checkout(&repo, &c1.to_hex()).unwrap();

        let s = status(&repo).unwrap();
        assert_eq!(s.branch, None);
        assert_eq!(s.head, Some(c1));
    }
}
