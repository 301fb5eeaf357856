use crate::error::Result;
use crate::hash::ObjectId;
use crate::refs::{self, RefValue};
use crate::repo::Repository;

/// create a branch pointing at a commit
pub fn create_branch(repo: &Repository, name: &str, start: ObjectId) -> Result<()> {
    refs::update_ref(
        repo,
        &format!("refs/heads/{name}"),
        &RefValue::direct(start),
        true,
    )
}

/// create a tag pointing at a commit
pub fn create_tag(repo: &Repository, name: &str, id: ObjectId) -> Result<()> {
    refs::update_ref(
        repo,
        &format!("refs/tags/{name}"),
        &RefValue::direct(id),
        true,
    )
}

/// name of the current branch, `None` when HEAD is detached
///
/// reads HEAD without dereferencing: symbolic means on-branch.
pub fn branch_name(repo: &Repository) -> Result<Option<String>> {
    let head = match refs::get_ref(repo, refs::HEAD, false)? {
        Some(head) => head,
        None => return Ok(None),
    };
    if !head.symbolic {
        return Ok(None);
    }
    Ok(head
        .value
        .strip_prefix("refs/heads/")
        .map(|name| name.to_string()))
}

/// list all branch names
pub fn branches(repo: &Repository) -> Result<Vec<String>> {
    let mut names: Vec<String> = refs::iter_refs(repo, "refs/heads/", true)?
        .into_iter()
        .filter_map(|(name, _)| {
            name.strip_prefix("refs/heads/")
                .map(|name| name.to_string())
        })
        .collect();
    names.sort();
    Ok(names)
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
    fn test_create_branch() {
        let (_dir, repo) = test_repo();

        create_branch(&repo, "feature", oid(1)).unwrap();

        let value = refs::get_ref(&repo, "refs/heads/feature", true)
            .unwrap()
            .unwrap();
        assert_eq!(value.id().unwrap(), oid(1));
    }

    #[test]
    fn test_create_tag() {
        let (_dir, repo) = test_repo();

        create_tag(&repo, "v1.0", oid(2)).unwrap();
        assert_eq!(crate::refs::resolve_name(&repo, "v1.0").unwrap(), oid(2));
    }

    #[test]
    fn test_branch_name_on_branch() {
        let (_dir, repo) = test_repo();

        // fresh repo: HEAD is symbolic to master
        assert_eq!(branch_name(&repo).unwrap(), Some("master".to_string()));
    }

    #[test]
    fn test_branch_name_detached() {
        let (_dir, repo) = test_repo();

        refs::update_ref(&repo, refs::HEAD, &RefValue::direct(oid(1)), false).unwrap();
        assert_eq!(branch_name(&repo).unwrap(), None);
    }

    #[test]
    fn test_branches_listing() {
        let (_dir, repo) = test_repo();

        create_branch(&repo, "one", oid(1)).unwrap();
        create_branch(&repo, "two", oid(2)).unwrap();
        create_branch(&repo, "nested/three", oid(3)).unwrap();

        let names = branches(&repo).unwrap();
        assert_eq!(names, vec!["nested/three", "one", "two"]);
    }
}
