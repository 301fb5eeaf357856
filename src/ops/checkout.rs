use crate::error::Result;
use crate::hash::ObjectId;
use crate::index::IndexTransaction;
use crate::object::read_commit;
use crate::refs::{self, RefValue};
use crate::repo::Repository;
use crate::worktree;

/// check out a branch, tag or commit
///
/// materializes the commit's tree, rewrites the index to match it, and
/// repoints HEAD: symbolic to the branch when `name` is one, direct to
/// the commit id (detached) otherwise. HEAD itself is written, never
/// its target.
pub fn checkout(repo: &Repository, name: &str) -> Result<()> {
    let id = refs::resolve_name(repo, name)?;
    let commit = read_commit(repo, &id)?;

    read_tree(repo, &commit.tree)?;

    let head = if refs::ref_exists(repo, &format!("refs/heads/{name}")) {
        RefValue::symbolic(format!("refs/heads/{name}"))
    } else {
        RefValue::direct(id)
    };
    refs::update_ref(repo, refs::HEAD, &head, false)
}

/// reproduce a tree in the working tree and index
pub fn read_tree(repo: &Repository, tree_id: &ObjectId) -> Result<()> {
    let entries = worktree::flatten(repo, tree_id)?;
    worktree::materialize_entries(repo, &entries)?;

    let mut tx = IndexTransaction::begin(repo)?;
    tx.replace(entries);
    tx.commit()
}

/// move HEAD to a commit without touching the working tree
///
/// dereferenced: on a branch, the branch moves.
pub fn reset(repo: &Repository, id: ObjectId) -> Result<()> {
    refs::update_ref(repo, refs::HEAD, &RefValue::direct(id), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{add, create_branch, create_commit};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempdir().unwrap();
        let repo_path = dir.path().join("repo");
        let repo = Repository::init(&repo_path).unwrap();
        (dir, repo)
    }

    fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) -> ObjectId {
        fs::write(repo.work_dir().join(name), content).unwrap();
        add(repo, &[PathBuf::from(name)]).unwrap();
        create_commit(repo, message).unwrap()
    }

    #[test]
    fn test_checkout_branch_restores_files() {
        let (_dir, repo) = test_repo();

        let c1 = commit_file(&repo, "a.txt", "hi\n", "first");
        create_branch(&repo, "feature", c1).unwrap();

        commit_file(&repo, "a.txt", "bye\n", "second");

        checkout(&repo, "feature").unwrap();

        // working tree holds the branch's content
        assert_eq!(fs::read(repo.work_dir().join("a.txt")).unwrap(), b"hi\n");

        // HEAD is symbolic to the branch, pointing at the first commit
        let head = refs::get_ref(&repo, refs::HEAD, false).unwrap().unwrap();
        assert!(head.symbolic);
        assert_eq!(head.value, "refs/heads/feature");
        assert_eq!(
            refs::get_ref(&repo, refs::HEAD, true).unwrap().unwrap().id().unwrap(),
            c1
        );
    }

    #[test]
    fn test_checkout_commit_id_detaches() {
        let (_dir, repo) = test_repo();

        let c1 = commit_file(&repo, "a.txt", "v1", "first");
        commit_file(&repo, "a.txt", "v2", "second");

        checkout(&repo, &c1.to_hex()).unwrap();

        let head = refs::get_ref(&repo, refs::HEAD, false).unwrap().unwrap();
        assert!(!head.symbolic);
        assert_eq!(head.id().unwrap(), c1);
    }

    #[test]
    fn test_checkout_refreshes_index() {
        let (_dir, repo) = test_repo();

        let c1 = commit_file(&repo, "a.txt", "v1", "first");
        create_branch(&repo, "feature", c1).unwrap();
        commit_file(&repo, "b.txt", "v2", "second");

        checkout(&repo, "feature").unwrap();

        let index = crate::index::load_index(&repo).unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.contains_key("a.txt"));

        // committing right after checkout reproduces the same snapshot
        let commit = crate::object::read_commit(&repo, &c1).unwrap();
        assert_eq!(
            crate::snapshot::write_snapshot_tree(&repo).unwrap(),
            commit.tree
        );
    }

    #[test]
    fn test_reset_moves_branch() {
        let (_dir, repo) = test_repo();

        let c1 = commit_file(&repo, "a.txt", "v1", "first");
        let c2 = commit_file(&repo, "a.txt", "v2", "second");

        reset(&repo, c1).unwrap();

        // branch moved, HEAD still symbolic, worktree untouched
        let head = refs::get_ref(&repo, refs::HEAD, false).unwrap().unwrap();
        assert!(head.symbolic);
        assert_eq!(refs::resolve_name(&repo, "@").unwrap(), c1);
        assert_eq!(fs::read(repo.work_dir().join("a.txt")).unwrap(), b"v2");

        reset(&repo, c2).unwrap();
        assert_eq!(refs::resolve_name(&repo, "@").unwrap(), c2);
    }
}
