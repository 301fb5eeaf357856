use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::{is_ancestor, reachable_objects};
use crate::object::object_exists;
use crate::refs::{self, RefValue};
use crate::repo::Repository;
use crate::transport::local::{copy_object, TransferStats};

const REMOTE_HEADS_BASE: &str = "refs/heads/";

/// push a ref to a peer repository
///
/// the local ref must exist, and when the peer already has it the local
/// commit must be a descendant (else `NonFastForward`, before anything
/// is written). only objects the peer cannot already reach through its
/// branches are copied; finally the peer's ref is set.
pub fn push(repo: &Repository, remote_path: &Path, refname: &str) -> Result<TransferStats> {
    let remote = Repository::open(remote_path)?;

    let local_id = refs::get_ref(repo, refname, true)?
        .ok_or_else(|| Error::RefNotFound(refname.to_string()))?
        .id()?;

    if let Some(remote_value) = refs::get_ref(&remote, refname, true)? {
        let remote_id = remote_value.id()?;
        if !is_ancestor(repo, local_id, remote_id)? {
            return Err(Error::NonFastForward {
                refname: refname.to_string(),
            });
        }
    }

    // objects the peer can reach through branches we also hold locally
    let mut known = Vec::new();
    for (_, value) in refs::iter_refs(&remote, REMOTE_HEADS_BASE, true)? {
        let id = value.id()?;
        if object_exists(repo, &id) {
            known.push(id);
        }
    }
    let remote_objects: HashSet<_> = reachable_objects(repo, known)?.into_iter().collect();

    let mut stats = TransferStats::default();
    for id in reachable_objects(repo, [local_id])? {
        if remote_objects.contains(&id) {
            continue;
        }
        copy_object(repo, &remote, &id, &mut stats)?;
    }

    refs::update_ref(&remote, refname, &RefValue::direct(local_id), true)?;

    debug!(
        refname,
        copied = stats.copied,
        skipped = stats.skipped,
        "pushed to peer"
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::ObjectId;
    use crate::ops::{add, create_commit};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn test_repo(dir: &tempfile::TempDir, name: &str) -> Repository {
        Repository::init(&dir.path().join(name)).unwrap()
    }

    fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) -> ObjectId {
        fs::write(repo.work_dir().join(name), content).unwrap();
        add(repo, &[PathBuf::from(name)]).unwrap();
        create_commit(repo, message).unwrap()
    }

    #[test]
    fn test_push_to_empty_peer() {
        let dir = tempdir().unwrap();
        let local = test_repo(&dir, "local");
        let peer = test_repo(&dir, "peer");

        let c1 = commit_file(&local, "a.txt", "hi\n", "first");

        let stats = push(&local, peer.work_dir(), "refs/heads/master").unwrap();
        assert!(stats.copied > 0);

        let value = refs::get_ref(&peer, "refs/heads/master", true)
            .unwrap()
            .unwrap();
        assert_eq!(value.id().unwrap(), c1);
        assert!(object_exists(&peer, &c1));
    }

    #[test]
    fn test_push_fast_forward() {
        let dir = tempdir().unwrap();
        let local = test_repo(&dir, "local");
        let peer = test_repo(&dir, "peer");

        commit_file(&local, "a.txt", "v1", "one");
        push(&local, peer.work_dir(), "refs/heads/master").unwrap();

        let c2 = commit_file(&local, "a.txt", "v2", "two");
        let stats = push(&local, peer.work_dir(), "refs/heads/master").unwrap();

        // the shared history is not re-sent
        assert!(stats.copied > 0);
        let value = refs::get_ref(&peer, "refs/heads/master", true)
            .unwrap()
            .unwrap();
        assert_eq!(value.id().unwrap(), c2);
    }

    #[test]
    fn test_push_non_fast_forward_rejected() {
        let dir = tempdir().unwrap();
        let local = test_repo(&dir, "local");
        let peer = test_repo(&dir, "peer");
        let unrelated = test_repo(&dir, "unrelated");

        // peer's master comes from an unrelated history
        commit_file(&unrelated, "b.txt", "other\n", "elsewhere");
        push(&unrelated, peer.work_dir(), "refs/heads/master").unwrap();

        // local has its own root commit
        let c1 = commit_file(&local, "a.txt", "mine\n", "local root");

        let result = push(&local, peer.work_dir(), "refs/heads/master");
        assert!(matches!(result, Err(Error::NonFastForward { .. })));

        // nothing was written to the peer
        assert!(!object_exists(&peer, &c1));
        let peer_master = refs::get_ref(&peer, "refs/heads/master", true)
            .unwrap()
            .unwrap();
        assert_ne!(peer_master.id().unwrap(), c1);
    }

    #[test]
    fn test_push_missing_local_ref_fails() {
        let dir = tempdir().unwrap();
        let local = test_repo(&dir, "local");
        let peer = test_repo(&dir, "peer");

        let result = push(&local, peer.work_dir(), "refs/heads/absent");
        assert!(matches!(result, Err(Error::RefNotFound(_))));
    }

    #[test]
    fn test_push_roundtrip_with_fetch() {
        let dir = tempdir().unwrap();
        let alice = test_repo(&dir, "alice");
        let server = test_repo(&dir, "server");
        let bob = test_repo(&dir, "bob");

        let c1 = commit_file(&alice, "shared.txt", "from alice\n", "publish");
        push(&alice, server.work_dir(), "refs/heads/master").unwrap();

        crate::transport::fetch(&bob, server.work_dir()).unwrap();
        let tracked = refs::get_ref(&bob, "refs/remote/master", true)
            .unwrap()
            .unwrap();
        assert_eq!(tracked.id().unwrap(), c1);
    }
}
