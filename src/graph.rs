use std::collections::{HashSet, VecDeque};

use crate::error::{Error, Result};
use crate::hash::ObjectId;
use crate::object::{read_commit, read_tree};
use crate::repo::Repository;
use crate::types::EntryKind;

/// breadth-first walk over commit ancestry
///
/// the mainline (first) parent of each commit goes to the front of the
/// work queue, remaining parents to the back, so mainline history is
/// emitted before diverging into merged branches. ids whose commit
/// object is missing are skipped.
pub struct Ancestors<'r> {
    repo: &'r Repository,
    queue: VecDeque<ObjectId>,
    visited: HashSet<ObjectId>,
}

impl<'r> Ancestors<'r> {
    pub fn new(repo: &'r Repository, seeds: impl IntoIterator<Item = ObjectId>) -> Self {
        Self {
            repo,
            queue: seeds.into_iter().collect(),
            visited: HashSet::new(),
        }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = Result<ObjectId>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.queue.pop_front() {
            if !self.visited.insert(id) {
                continue;
            }

            let commit = match read_commit(self.repo, &id) {
                Ok(commit) => commit,
                Err(Error::ObjectNotFound(_)) => continue,
                Err(e) => return Some(Err(e)),
            };

            let mut parents = commit.parents.iter();
            if let Some(mainline) = parents.next() {
                self.queue.push_front(*mainline);
            }
            for parent in parents {
                self.queue.push_back(*parent);
            }

            return Some(Ok(id));
        }
        None
    }
}

/// collect the ancestor closure of `seeds` in walk order
pub fn walk_ancestors(
    repo: &Repository,
    seeds: impl IntoIterator<Item = ObjectId>,
) -> Result<Vec<ObjectId>> {
    Ancestors::new(repo, seeds).collect()
}

/// find the closest common ancestor of two commits
///
/// ancestors of `a` are collected into a set; the first ancestor of `b`
/// in the set is the base. `None` when the histories are disjoint.
pub fn merge_base(repo: &Repository, a: ObjectId, b: ObjectId) -> Result<Option<ObjectId>> {
    let of_a: HashSet<ObjectId> = walk_ancestors(repo, [a])?.into_iter().collect();

    for id in Ancestors::new(repo, [b]) {
        let id = id?;
        if of_a.contains(&id) {
            return Ok(Some(id));
        }
    }
    Ok(None)
}

/// is `maybe` an ancestor of `commit` (inclusive)
pub fn is_ancestor(repo: &Repository, commit: ObjectId, maybe: ObjectId) -> Result<bool> {
    for id in Ancestors::new(repo, [commit]) {
        if id? == maybe {
            return Ok(true);
        }
    }
    Ok(false)
}

/// every object reachable from the given commits
///
/// yields each commit in ancestry order and, transitively, every tree
/// and blob its snapshot references, deduplicated.
pub fn reachable_objects(
    repo: &Repository,
    seeds: impl IntoIterator<Item = ObjectId>,
) -> Result<Vec<ObjectId>> {
    let mut result = Vec::new();
    let mut visited = HashSet::new();

    for commit_id in Ancestors::new(repo, seeds) {
        let commit_id = commit_id?;
        if !visited.insert(commit_id) {
            continue;
        }
        result.push(commit_id);

        let commit = read_commit(repo, &commit_id)?;

        // descend the snapshot with an explicit stack
        let mut stack = vec![commit.tree];
        while let Some(tree_id) = stack.pop() {
            if !visited.insert(tree_id) {
                continue;
            }
            result.push(tree_id);

            let tree = read_tree(repo, &tree_id)?;
            for entry in tree.entries() {
                match entry.kind {
                    EntryKind::Tree => stack.push(entry.id),
                    EntryKind::Blob => {
                        if visited.insert(entry.id) {
                            result.push(entry.id);
                        }
                    }
                }
            }
        }
    }

    Ok(result)
}
