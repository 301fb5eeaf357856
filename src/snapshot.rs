use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{IoResultExt, Result};
use crate::hash::ObjectId;
use crate::index::{index_in_use, load_index, IndexEntries};
use crate::object::{write_blob, write_tree};
use crate::repo::{Repository, DATA_DIR};
use crate::types::{Tree, TreeEntry};

/// write the current snapshot as a tree object
///
/// the index is canonical once it exists; otherwise the working tree is
/// scanned directly. both modes yield the same id when the index
/// mirrors the working tree.
pub fn write_snapshot_tree(repo: &Repository) -> Result<ObjectId> {
    if index_in_use(repo) {
        let index = load_index(repo)?;
        write_tree_from_index(repo, &index)
    } else {
        write_tree_from_worktree(repo, repo.work_dir())
    }
}

/// build tree objects from the index
///
/// paths are split on `/` into components; each directory level becomes
/// one tree, written bottom-up.
pub fn write_tree_from_index(repo: &Repository, index: &IndexEntries) -> Result<ObjectId> {
    let entries: Vec<(&str, ObjectId)> = index
        .iter()
        .map(|(path, id)| (path.as_str(), *id))
        .collect();
    write_index_dir(repo, entries)
}

/// write one directory level of index entries
///
/// entries whose path has no remaining separator are blob leaves; the
/// rest are grouped by their leading component into subdirectories,
/// each written first so the level's tree can reference it.
fn write_index_dir(repo: &Repository, entries: Vec<(&str, ObjectId)>) -> Result<ObjectId> {
    let mut records = Vec::new();
    let mut subdirs: BTreeMap<&str, Vec<(&str, ObjectId)>> = BTreeMap::new();

    for (path, id) in entries {
        match path.split_once('/') {
            None => records.push(TreeEntry::blob(path, id)),
            Some((dir, rest)) => subdirs.entry(dir).or_default().push((rest, id)),
        }
    }

    for (name, children) in subdirs {
        let subtree = write_index_dir(repo, children)?;
        records.push(TreeEntry::tree(name, subtree));
    }

    write_tree(repo, &Tree::new(records)?)
}

/// build tree objects by scanning a directory
///
/// files become blobs, subdirectories recurse; the data directory is
/// skipped.
pub fn write_tree_from_worktree(repo: &Repository, dir: &Path) -> Result<ObjectId> {
    let mut dir_entries: Vec<_> = fs::read_dir(dir)
        .with_path(dir)?
        .collect::<std::io::Result<Vec<_>>>()
        .with_path(dir)?;
    dir_entries.sort_by_key(|e| e.file_name());

    let mut entries = Vec::new();
    for entry in dir_entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if name == DATA_DIR {
            continue;
        }

        let file_type = entry.file_type().with_path(&path)?;
        if file_type.is_file() {
            let content = fs::read(&path).with_path(&path)?;
            let id = write_blob(repo, &content)?;
            entries.push(TreeEntry::blob(name, id));
        } else if file_type.is_dir() {
            let id = write_tree_from_worktree(repo, &path)?;
            entries.push(TreeEntry::tree(name, id));
        }
    }

    write_tree(repo, &Tree::new(entries)?)
}
