use std::collections::HashMap;
use std::fmt;

use crate::error::Result;
use crate::graph::Ancestors;
use crate::hash::ObjectId;
use crate::object::read_commit;
use crate::refs;
use crate::repo::Repository;
use crate::types::Commit;

/// one commit in the history listing
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub id: ObjectId,
    pub commit: Commit,
    /// names of refs pointing at this commit
    pub refs: Vec<String>,
}

/// walk history from a commit, newest first along the mainline
pub fn log(repo: &Repository, from: ObjectId) -> Result<Vec<LogEntry>> {
    // group ref names by the commit they point at
    let mut by_target: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in refs::iter_refs(repo, "", true)? {
        by_target.entry(value.value).or_default().push(name);
    }

    let mut entries = Vec::new();
    for id in Ancestors::new(repo, [from]) {
        let id = id?;
        let commit = read_commit(repo, &id)?;
        let refs = by_target.remove(&id.to_hex()).unwrap_or_default();
        entries.push(LogEntry { id, commit, refs });
    }

    Ok(entries)
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.refs.is_empty() {
            writeln!(f, "commit {}", self.id)?;
        } else {
            writeln!(f, "commit {} ({})", self.id, self.refs.join(", "))?;
        }
        writeln!(f)?;
        for line in self.commit.message.lines() {
            writeln!(f, "    {line}")?;
        }
        Ok(())
    }
}
