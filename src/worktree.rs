use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path};

use walkdir::WalkDir;

use crate::error::{IoResultExt, Result};
use crate::hash::{hash_object, Kind, ObjectId};
use crate::object::{read_blob, read_tree};
use crate::repo::{Repository, DATA_DIR};
use crate::types::EntryKind;

/// flatten a tree into a map of relative paths to blob ids
///
/// walks the tree with an explicit work stack; entry names are
/// re-validated by the tree parser on each level.
pub fn flatten(repo: &Repository, tree_id: &ObjectId) -> Result<BTreeMap<String, ObjectId>> {
    let mut result = BTreeMap::new();
    let mut stack = vec![(*tree_id, String::new())];

    while let Some((id, prefix)) = stack.pop() {
        let tree = read_tree(repo, &id)?;
        for entry in tree.entries() {
            let path = if prefix.is_empty() {
                entry.name.clone()
            } else {
                format!("{}/{}", prefix, entry.name)
            };
            match entry.kind {
                EntryKind::Blob => {
                    result.insert(path, entry.id);
                }
                EntryKind::Tree => {
                    stack.push((entry.id, path));
                }
            }
        }
    }

    Ok(result)
}

/// is any component of the path the data directory
fn is_ignored(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(name) if name == DATA_DIR))
}

/// remove everything from the working tree except the data directory
///
/// files go first, then now-empty directories bottom-up. removal errors
/// on directories are ignored; user files may legitimately remain in
/// them.
pub fn empty_worktree(repo: &Repository) -> Result<()> {
    let root = repo.work_dir();

    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let entry = entry.map_err(|e| crate::Error::Io {
            path: root.to_path_buf(),
            source: e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("walkdir error")),
        })?;
        let rel = match entry.path().strip_prefix(root) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        if is_ignored(rel) {
            continue;
        }

        if entry.file_type().is_dir() {
            let _ = fs::remove_dir(entry.path());
        } else {
            fs::remove_file(entry.path()).with_path(entry.path())?;
        }
    }

    Ok(())
}

/// write a flattened path map into the working tree
///
/// the worktree is emptied first; parent directories are created as
/// needed.
pub fn materialize_entries(
    repo: &Repository,
    entries: &BTreeMap<String, ObjectId>,
) -> Result<()> {
    empty_worktree(repo)?;

    for (path, id) in entries {
        let target = repo.work_dir().join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).with_path(parent)?;
        }
        let content = read_blob(repo, id)?;
        fs::write(&target, content).with_path(&target)?;
    }

    Ok(())
}

/// reproduce a tree object in the working tree
pub fn materialize(repo: &Repository, tree_id: &ObjectId) -> Result<()> {
    let entries = flatten(repo, tree_id)?;
    materialize_entries(repo, &entries)
}

/// hash the current working tree into a path map, without storing
///
/// used by status and diff; the pure hash means nothing is written to
/// the object store.
pub fn worktree_snapshot(repo: &Repository) -> Result<BTreeMap<String, ObjectId>> {
    let root = repo.work_dir();
    let mut result = BTreeMap::new();

    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(|e| crate::Error::Io {
            path: root.to_path_buf(),
            source: e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("walkdir error")),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = match entry.path().strip_prefix(root) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        if is_ignored(rel) {
            continue;
        }

        let content = fs::read(entry.path()).with_path(entry.path())?;
        let path = rel.to_string_lossy().replace('\\', "/");
        result.insert(path, hash_object(Kind::Blob, &content));
    }

    Ok(result)
}
