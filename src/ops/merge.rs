use std::collections::BTreeMap;

use tracing::debug;

use crate::diff::merge_trees;
use crate::error::{Error, Result};
use crate::graph::merge_base;
use crate::hash::ObjectId;
use crate::index::IndexTransaction;
use crate::object::read_commit;
use crate::refs::{self, RefValue};
use crate::repo::Repository;
use crate::worktree::{flatten, materialize_entries};

/// how a merge concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// HEAD was simply advanced to the other commit
    FastForward(ObjectId),
    /// a three-way merge was staged; MERGE_HEAD is set and a commit is
    /// pending
    Merged,
}

/// merge another commit into HEAD
///
/// when HEAD is an ancestor of `other` the branch fast-forwards:
/// worktree and index take the other snapshot and no commit is
/// recorded. otherwise MERGE_HEAD is set and the base/head/other trees
/// are merged three-way into the index and working tree; conflicts are
/// embedded as markers, never errors, and the next `create_commit`
/// records both parents.
pub fn merge(repo: &Repository, other: ObjectId) -> Result<MergeOutcome> {
    let head = refs::get_ref(repo, refs::HEAD, true)?
        .ok_or_else(|| Error::RefNotFound(refs::HEAD.to_string()))?
        .id()?;

    let base = merge_base(repo, other, head)?;

    if base == Some(head) {
        let commit = read_commit(repo, &other)?;
        let entries = flatten(repo, &commit.tree)?;
        materialize_entries(repo, &entries)?;

        let mut tx = IndexTransaction::begin(repo)?;
        tx.replace(entries);
        tx.commit()?;

        refs::update_ref(repo, refs::HEAD, &RefValue::direct(other), true)?;

        debug!(%other, "fast-forward merge");
        return Ok(MergeOutcome::FastForward(other));
    }

    refs::update_ref(repo, refs::MERGE_HEAD, &RefValue::direct(other), true)?;

    let base_tree = match base {
        Some(id) => flatten(repo, &read_commit(repo, &id)?.tree)?,
        None => BTreeMap::new(),
    };
    let head_tree = flatten(repo, &read_commit(repo, &head)?.tree)?;
    let other_tree = flatten(repo, &read_commit(repo, &other)?.tree)?;

    let merged = merge_trees(repo, &base_tree, &head_tree, &other_tree)?;

    let mut tx = IndexTransaction::begin(repo)?;
    tx.replace(merged.clone());
    tx.commit()?;

    materialize_entries(repo, &merged)?;

    debug!(%head, %other, "three-way merge staged");
    Ok(MergeOutcome::Merged)
}
