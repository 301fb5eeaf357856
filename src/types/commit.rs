use crate::error::{Error, Result};
use crate::hash::ObjectId;

/// a commit object: a tree snapshot plus its parent edges and message
///
/// payload format is a header block (`tree` exactly once, then zero or
/// more `parent` lines, first parent is the mainline), a blank line, and
/// the message followed by a single trailing newline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub message: String,
}

impl Commit {
    pub fn new(tree: ObjectId, parents: Vec<ObjectId>, message: impl Into<String>) -> Self {
        Self {
            tree,
            parents,
            message: message.into(),
        }
    }

    /// is this an initial commit (no parents)
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// is this a merge commit (multiple parents)
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// serialize to the commit payload format
    pub fn to_payload(&self) -> Vec<u8> {
        let mut out = String::new();
        out.push_str(&format!("tree {}\n", self.tree));
        for parent in &self.parents {
            out.push_str(&format!("parent {parent}\n"));
        }
        out.push('\n');
        out.push_str(&self.message);
        out.push('\n');
        out.into_bytes()
    }

    /// parse a commit payload
    ///
    /// strict: single-space key/value separation, exactly one `tree`
    /// header, unknown headers rejected. `id` is the commit's own id,
    /// used only for error reporting.
    pub fn parse(id: ObjectId, payload: &[u8]) -> Result<Self> {
        let corrupt = |reason: String| Error::Corrupt { id, reason };

        let text = std::str::from_utf8(payload)
            .map_err(|_| corrupt("commit payload is not utf-8".to_string()))?;

        let mut tree = None;
        let mut parents = Vec::new();

        let mut lines = text.split('\n');
        for line in lines.by_ref() {
            if line.is_empty() {
                break;
            }

            let (key, value) = line
                .split_once(' ')
                .ok_or_else(|| corrupt(format!("malformed header: {line:?}")))?;

            let value = ObjectId::from_hex(value)
                .map_err(|_| corrupt(format!("malformed id in header: {line:?}")))?;

            match key {
                "tree" => {
                    if tree.replace(value).is_some() {
                        return Err(corrupt("duplicate tree header".to_string()));
                    }
                }
                "parent" => parents.push(value),
                other => return Err(corrupt(format!("unknown header: {other}"))),
            }
        }

        let tree = tree.ok_or_else(|| corrupt("missing tree header".to_string()))?;

        // the rest is the message; drop the trailing newline added on write
        let message: String = lines.collect::<Vec<_>>().join("\n");
        let message = message
            .strip_suffix('\n')
            .unwrap_or(&message)
            .to_string();

        Ok(Self {
            tree,
            parents,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(n: u8) -> ObjectId {
        ObjectId::from_bytes([n; 20])
    }

    #[test]
    fn test_commit_payload_format() {
        let c = Commit::new(oid(1), vec![oid(2)], "first commit");
        let payload = String::from_utf8(c.to_payload()).unwrap();

        assert_eq!(
            payload,
            format!("tree {}\nparent {}\n\nfirst commit\n", oid(1), oid(2))
        );
    }

    #[test]
    fn test_commit_roundtrip() {
        let c = Commit::new(oid(1), vec![oid(2), oid(3)], "merge branch");
        let parsed = Commit::parse(oid(9), &c.to_payload()).unwrap();
        assert_eq!(c, parsed);
    }

    #[test]
    fn test_commit_roundtrip_multiline_message() {
        let c = Commit::new(oid(1), vec![], "subject\n\nbody line one\nbody line two");
        let parsed = Commit::parse(oid(9), &c.to_payload()).unwrap();
        assert_eq!(c, parsed);
    }

    #[test]
    fn test_commit_root() {
        let c = Commit::new(oid(1), vec![], "initial");
        assert!(c.is_root());
        assert!(!c.is_merge());

        let parsed = Commit::parse(oid(9), &c.to_payload()).unwrap();
        assert!(parsed.parents.is_empty());
    }

    #[test]
    fn test_commit_merge_parent_order() {
        let c = Commit::new(oid(1), vec![oid(2), oid(3)], "merge");
        assert!(c.is_merge());

        let parsed = Commit::parse(oid(9), &c.to_payload()).unwrap();
        assert_eq!(parsed.parents, vec![oid(2), oid(3)]);
    }

    #[test]
    fn test_commit_stability() {
        // identical tree, parents and message serialize identically
        let c1 = Commit::new(oid(1), vec![oid(2)], "same");
        let c2 = Commit::new(oid(1), vec![oid(2)], "same");
        assert_eq!(c1.to_payload(), c2.to_payload());
    }

    #[test]
    fn test_commit_parse_rejects_unknown_header() {
        let payload = format!("tree {}\nauthor someone\n\nmsg\n", oid(1));
        let result = Commit::parse(oid(9), payload.as_bytes());
        assert!(matches!(result, Err(Error::Corrupt { .. })));
    }

    #[test]
    fn test_commit_parse_rejects_missing_tree() {
        let payload = format!("parent {}\n\nmsg\n", oid(2));
        let result = Commit::parse(oid(9), payload.as_bytes());
        assert!(matches!(result, Err(Error::Corrupt { .. })));
    }

    #[test]
    fn test_commit_parse_rejects_duplicate_tree() {
        let payload = format!("tree {}\ntree {}\n\nmsg\n", oid(1), oid(2));
        let result = Commit::parse(oid(9), payload.as_bytes());
        assert!(matches!(result, Err(Error::Corrupt { .. })));
    }

    #[test]
    fn test_commit_parse_rejects_malformed_id() {
        let payload = "tree nothex\n\nmsg\n";
        let result = Commit::parse(oid(9), payload.as_bytes());
        assert!(matches!(result, Err(Error::Corrupt { .. })));
    }

    #[test]
    fn test_commit_parse_empty_message() {
        let c = Commit::new(oid(1), vec![], "");
        let parsed = Commit::parse(oid(9), &c.to_payload()).unwrap();
        assert_eq!(parsed.message, "");
    }
}
