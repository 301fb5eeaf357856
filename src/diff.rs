use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::process::Command;

use tracing::debug;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::ObjectId;
use crate::object::{read_blob, write_blob};
use crate::repo::Repository;

/// how a path changed between two snapshots
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    New,
    Modified,
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::New => f.write_str("new file"),
            ChangeKind::Modified => f.write_str("modified"),
            ChangeKind::Deleted => f.write_str("deleted"),
        }
    }
}

/// union of paths across snapshots, with each side's blob id
fn compare_trees<'a>(
    trees: &[&'a BTreeMap<String, ObjectId>],
) -> BTreeMap<&'a str, Vec<Option<ObjectId>>> {
    let mut entries: BTreeMap<&str, Vec<Option<ObjectId>>> = BTreeMap::new();

    for (index, tree) in trees.iter().enumerate() {
        for (path, id) in tree.iter() {
            let slots = entries
                .entry(path.as_str())
                .or_insert_with(|| vec![None; trees.len()]);
            slots[index] = Some(*id);
        }
    }

    entries
}

/// list the paths that differ between two flattened snapshots
pub fn changed_files(
    from: &BTreeMap<String, ObjectId>,
    to: &BTreeMap<String, ObjectId>,
) -> Vec<(String, ChangeKind)> {
    let mut changes = Vec::new();

    for (path, ids) in compare_trees(&[from, to]) {
        let (from_id, to_id) = (ids[0], ids[1]);
        if from_id == to_id {
            continue;
        }
        let kind = match (from_id, to_id) {
            (None, Some(_)) => ChangeKind::New,
            (Some(_), None) => ChangeKind::Deleted,
            _ => ChangeKind::Modified,
        };
        changes.push((path.to_string(), kind));
    }

    changes
}

/// unified diff of two blobs via the external `diff` tool
///
/// either side may be absent (new or deleted file); the scratch file is
/// then empty. exit status 0 and 1 both mean success.
pub fn diff_blobs(
    repo: &Repository,
    from: Option<&ObjectId>,
    to: Option<&ObjectId>,
    path: &str,
) -> Result<Vec<u8>> {
    let file_from = scratch_blob(repo, from)?;
    let file_to = scratch_blob(repo, to)?;

    let output = Command::new("diff")
        .arg("--unified")
        .arg("--show-c-function")
        .arg("--label")
        .arg(format!("a/{path}"))
        .arg(file_from.path())
        .arg("--label")
        .arg(format!("b/{path}"))
        .arg(file_to.path())
        .output()
        .map_err(|e| Error::ExternalTool {
            tool: "diff",
            message: e.to_string(),
        })?;

    match output.status.code() {
        Some(0) | Some(1) => Ok(output.stdout),
        code => Err(Error::ExternalTool {
            tool: "diff",
            message: format!("unexpected exit status {code:?}"),
        }),
    }
}

/// unified diff between two flattened snapshots
///
/// emits `{path}\n` followed by the blob diff for each changed entry.
pub fn diff_trees(
    repo: &Repository,
    from: &BTreeMap<String, ObjectId>,
    to: &BTreeMap<String, ObjectId>,
) -> Result<Vec<u8>> {
    let mut output = Vec::new();

    for (path, ids) in compare_trees(&[from, to]) {
        let (from_id, to_id) = (ids[0], ids[1]);
        if from_id == to_id {
            continue;
        }
        output.extend_from_slice(path.as_bytes());
        output.push(b'\n');
        output.extend_from_slice(&diff_blobs(repo, from_id.as_ref(), to_id.as_ref(), path)?);
    }

    Ok(output)
}

/// three-way merge of blobs via the external `diff3` tool
///
/// exit status 0 is a clean merge, 1 a conflicted one; both are data,
/// not errors - conflicts come back with markers embedded.
pub fn merge_blobs(
    repo: &Repository,
    base: Option<&ObjectId>,
    head: Option<&ObjectId>,
    other: Option<&ObjectId>,
) -> Result<Vec<u8>> {
    let file_base = scratch_blob(repo, base)?;
    let file_head = scratch_blob(repo, head)?;
    let file_other = scratch_blob(repo, other)?;

    let output = Command::new("diff3")
        .arg("-m")
        .arg("-L")
        .arg("HEAD")
        .arg(file_head.path())
        .arg("-L")
        .arg("BASE")
        .arg(file_base.path())
        .arg("-L")
        .arg("MERGE_HEAD")
        .arg(file_other.path())
        .output()
        .map_err(|e| Error::ExternalTool {
            tool: "diff3",
            message: e.to_string(),
        })?;

    match output.status.code() {
        Some(0) => Ok(output.stdout),
        Some(1) => {
            debug!("merge produced conflicts");
            Ok(output.stdout)
        }
        code => Err(Error::ExternalTool {
            tool: "diff3",
            message: format!("unexpected exit status {code:?}"),
        }),
    }
}

/// three-way merge of flattened snapshots
///
/// every path in the union of the three maps is merged; the merged
/// payloads are stored as blobs and the resulting staging map returned.
pub fn merge_trees(
    repo: &Repository,
    base: &BTreeMap<String, ObjectId>,
    head: &BTreeMap<String, ObjectId>,
    other: &BTreeMap<String, ObjectId>,
) -> Result<BTreeMap<String, ObjectId>> {
    let mut merged = BTreeMap::new();

    for (path, ids) in compare_trees(&[base, head, other]) {
        let (base_id, head_id, other_id) = (ids[0], ids[1], ids[2]);
        let payload = merge_blobs(repo, base_id.as_ref(), head_id.as_ref(), other_id.as_ref())?;
        let id = write_blob(repo, &payload)?;
        merged.insert(path.to_string(), id);
    }

    Ok(merged)
}

/// write an optional blob to a scratch file for an external tool
fn scratch_blob(repo: &Repository, id: Option<&ObjectId>) -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::NamedTempFile::new().map_err(|e| Error::Io {
        path: std::env::temp_dir(),
        source: e,
    })?;

    if let Some(id) = id {
        let content = read_blob(repo, id)?;
        file.write_all(&content).with_path(file.path())?;
        file.flush().with_path(file.path())?;
    }

    Ok(file)
}
