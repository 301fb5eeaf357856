use std::fmt;

use crate::error::{Error, Result};
use crate::hash::ObjectId;

/// a directory tree - records sorted ascending by name
///
/// the payload is one line per entry: `"{kind} {id} {name}\n"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// create a new tree, validating and sorting entries
    pub fn new(mut entries: Vec<TreeEntry>) -> Result<Self> {
        for entry in &entries {
            validate_entry_name(&entry.name)?;
        }

        // sort by name (byte-wise)
        entries.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));

        for window in entries.windows(2) {
            if window[0].name == window[1].name {
                return Err(Error::DuplicateEntryName(window[0].name.clone()));
            }
        }

        Ok(Self { entries })
    }

    /// create an empty tree
    pub fn empty() -> Self {
        Self { entries: vec![] }
    }

    /// serialize to the tree payload format
    pub fn to_payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in &self.entries {
            out.extend_from_slice(
                format!("{} {} {}\n", entry.kind, entry.id, entry.name).as_bytes(),
            );
        }
        out
    }

    /// parse a tree payload, enforcing the invariants it was written under
    ///
    /// `id` is the tree's own id, used only for error reporting.
    pub fn parse(id: ObjectId, payload: &[u8]) -> Result<Self> {
        let corrupt = |reason: String| Error::Corrupt { id, reason };

        let text = std::str::from_utf8(payload)
            .map_err(|_| corrupt("tree payload is not utf-8".to_string()))?;

        let mut entries: Vec<TreeEntry> = Vec::new();
        for line in text.lines() {
            let mut parts = line.splitn(3, ' ');
            let (kind, entry_id, name) = match (parts.next(), parts.next(), parts.next()) {
                (Some(k), Some(i), Some(n)) => (k, i, n),
                _ => return Err(corrupt(format!("malformed tree record: {line:?}"))),
            };

            let kind = match kind {
                "blob" => EntryKind::Blob,
                "tree" => EntryKind::Tree,
                other => return Err(corrupt(format!("unknown tree entry kind: {other}"))),
            };

            if entry_id.len() != 40 || entry_id.bytes().any(|b| !b.is_ascii_lowercase() && !b.is_ascii_digit()) {
                return Err(corrupt(format!("malformed id in tree record: {entry_id}")));
            }
            let entry_id = ObjectId::from_hex(entry_id)
                .map_err(|_| corrupt(format!("malformed id in tree record: {line:?}")))?;

            validate_entry_name(name)
                .map_err(|e| corrupt(format!("bad entry name: {e}")))?;

            if let Some(prev) = entries.last() {
                if prev.name.as_bytes() >= name.as_bytes() {
                    return Err(corrupt(format!(
                        "tree records out of order: {:?} before {:?}",
                        prev.name, name
                    )));
                }
            }

            entries.push(TreeEntry {
                kind,
                id: entry_id,
                name: name.to_string(),
            });
        }

        Ok(Self { entries })
    }

    /// get entries slice
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// look up entry by name
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries
            .binary_search_by(|e| e.name.as_bytes().cmp(name.as_bytes()))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// is tree empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// validate a single path component used as an entry name
fn validate_entry_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidEntryName("empty name".to_string()));
    }
    if name.contains('/') {
        return Err(Error::InvalidEntryName(format!(
            "name contains '/': {name}"
        )));
    }
    if name.contains('\0') {
        return Err(Error::InvalidEntryName(format!(
            "name contains null byte: {name}"
        )));
    }
    if name == "." || name == ".." {
        return Err(Error::InvalidEntryName(format!("reserved name: {name}")));
    }
    Ok(())
}

/// a single record in a tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    pub kind: EntryKind,
    pub id: ObjectId,
    pub name: String,
}

impl TreeEntry {
    pub fn blob(name: impl Into<String>, id: ObjectId) -> Self {
        Self {
            kind: EntryKind::Blob,
            id,
            name: name.into(),
        }
    }

    pub fn tree(name: impl Into<String>, id: ObjectId) -> Self {
        Self {
            kind: EntryKind::Tree,
            id,
            name: name.into(),
        }
    }
}

/// kind of tree record: a file leaf or a subdirectory
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Blob,
    Tree,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Blob => f.write_str("blob"),
            EntryKind::Tree => f.write_str("tree"),
        }
    }
}
