use tracing::debug;

use crate::error::Result;
use crate::hash::ObjectId;
use crate::object::write_commit;
use crate::refs::{self, RefValue};
use crate::repo::Repository;
use crate::snapshot::write_snapshot_tree;
use crate::types::Commit;

/// record the current snapshot as a commit
///
/// the tree comes from the snapshot builder (index when in use, working
/// tree otherwise). the dereferenced HEAD becomes the mainline parent
/// when present; a pending MERGE_HEAD becomes the second parent and is
/// cleared. HEAD (dereferenced - the branch, not HEAD itself) then
/// moves to the new commit.
pub fn create_commit(repo: &Repository, message: &str) -> Result<ObjectId> {
    let tree = write_snapshot_tree(repo)?;

    let mut parents = Vec::new();
    if let Some(head) = refs::get_ref(repo, refs::HEAD, true)? {
        parents.push(head.id()?);
    }
    if let Some(merge_head) = refs::get_ref(repo, refs::MERGE_HEAD, true)? {
        parents.push(merge_head.id()?);
        refs::delete_ref(repo, refs::MERGE_HEAD, false)?;
    }

    let id = write_commit(repo, &Commit::new(tree, parents, message))?;
    refs::update_ref(repo, refs::HEAD, &RefValue::direct(id), true)?;

    debug!(%id, "created commit");

    Ok(id)
}
