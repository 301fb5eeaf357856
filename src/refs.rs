use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::ObjectId;
use crate::repo::Repository;

/// the current-commit reference
pub const HEAD: &str = "HEAD";
/// set while a merge is pending a commit
pub const MERGE_HEAD: &str = "MERGE_HEAD";

/// value held by a reference file
///
/// direct refs store a 40-hex object id; symbolic refs store the name of
/// another reference (on disk with a `"ref: "` prefix).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefValue {
    pub symbolic: bool,
    pub value: String,
}

impl RefValue {
    pub fn direct(id: ObjectId) -> Self {
        Self {
            symbolic: false,
            value: id.to_hex(),
        }
    }

    pub fn symbolic(target: impl Into<String>) -> Self {
        Self {
            symbolic: true,
            value: target.into(),
        }
    }

    /// parse the direct value as an object id
    pub fn id(&self) -> Result<ObjectId> {
        ObjectId::from_hex(&self.value)
    }
}

/// create or update a reference
///
/// with `deref`, a symbolic chain is followed and the terminal reference
/// is the one written; `HEAD` itself only changes when `deref` is false.
pub fn update_ref(repo: &Repository, name: &str, value: &RefValue, deref: bool) -> Result<()> {
    validate_ref_name(name)?;
    if value.value.is_empty() {
        return Err(Error::InvalidRef(format!("empty value for {name}")));
    }

    let (name, _) = follow(repo, name, deref)?;
    let path = ref_path(repo, &name);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_path(parent)?;
    }

    let content = if value.symbolic {
        format!("ref: {}\n", value.value)
    } else {
        format!("{}\n", value.value)
    };

    // atomic write: temp -> fsync -> rename
    let tmp_path = repo.tmp_path().join(uuid::Uuid::new_v4().to_string());
    {
        let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
        tmp_file.write_all(content.as_bytes()).with_path(&tmp_path)?;
        tmp_file.sync_all().with_path(&tmp_path)?;
    }
    fs::rename(&tmp_path, &path).with_path(&path)?;

    Ok(())
}

/// read a reference
///
/// with `deref`, symbolic links are followed to the terminal direct
/// value. returns `None` when the terminal file does not exist.
pub fn get_ref(repo: &Repository, name: &str, deref: bool) -> Result<Option<RefValue>> {
    let (_, value) = follow(repo, name, deref)?;
    Ok(value)
}

/// delete a reference; succeeds silently when already absent
pub fn delete_ref(repo: &Repository, name: &str, deref: bool) -> Result<()> {
    let (name, _) = follow(repo, name, deref)?;
    let path = ref_path(repo, &name);

    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Io { path, source: e }),
    }
}

/// check whether a reference file exists (no dereferencing)
pub fn ref_exists(repo: &Repository, name: &str) -> bool {
    ref_path(repo, name).is_file()
}

/// iterate references whose name starts with `prefix`
///
/// yields `HEAD`, `MERGE_HEAD` and every file under `refs/`, in
/// filesystem order within `refs/`. refs whose terminal file is absent
/// are skipped.
pub fn iter_refs(repo: &Repository, prefix: &str, deref: bool) -> Result<Vec<(String, RefValue)>> {
    let mut names = vec![HEAD.to_string(), MERGE_HEAD.to_string()];

    let refs_dir = repo.git_dir().join("refs");
    if refs_dir.is_dir() {
        for entry in WalkDir::new(&refs_dir) {
            let entry = entry.map_err(|e| Error::Io {
                path: refs_dir.clone(),
                source: e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("walkdir error")),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(repo.git_dir()) {
                names.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }

    let mut refs = Vec::new();
    for name in names {
        if !name.starts_with(prefix) {
            continue;
        }
        if let Some(value) = get_ref(repo, &name, deref)? {
            refs.push((name, value));
        }
    }

    Ok(refs)
}

/// resolve a name to an object id
///
/// `@` is an alias for `HEAD`. the name is tried as given, then under
/// `refs/`, `refs/tags/` and `refs/heads/`; failing those, a string of
/// exactly 40 lowercase hex characters is taken as a literal id.
pub fn resolve_name(repo: &Repository, name: &str) -> Result<ObjectId> {
    let name = if name == "@" { HEAD } else { name };

    let candidates = [
        name.to_string(),
        format!("refs/{name}"),
        format!("refs/tags/{name}"),
        format!("refs/heads/{name}"),
    ];

    for candidate in &candidates {
        if let Some(value) = get_ref(repo, candidate, true)? {
            return value.id();
        }
    }

    let is_id = name.len() == 40
        && name
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if is_id {
        return ObjectId::from_hex(name);
    }

    Err(Error::UnknownName(name.to_string()))
}

/// follow a symbolic chain
///
/// returns the terminal reference name and its value (None when the
/// terminal file is absent). with `deref` false, only one file is read.
fn follow(repo: &Repository, name: &str, deref: bool) -> Result<(String, Option<RefValue>)> {
    let mut name = name.to_string();

    loop {
        let path = ref_path(repo, &name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((name, None)),
            Err(e) => return Err(Error::Io { path, source: e }),
        };

        let trimmed = content.trim();
        match trimmed.strip_prefix("ref:") {
            Some(target) => {
                let target = target.trim().to_string();
                if deref {
                    name = target;
                } else {
                    return Ok((name, Some(RefValue::symbolic(target))));
                }
            }
            None => {
                return Ok((
                    name,
                    Some(RefValue {
                        symbolic: false,
                        value: trimmed.to_string(),
                    }),
                ))
            }
        }
    }
}

/// get the filesystem path of a reference
fn ref_path(repo: &Repository, name: &str) -> PathBuf {
    repo.git_dir().join(name)
}

/// validate a reference name
fn validate_ref_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidRef("empty ref name".to_string()));
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(Error::InvalidRef(format!(
            "ref name cannot start or end with '/': {name}"
        )));
    }
    if name.contains("//") {
        return Err(Error::InvalidRef(format!(
            "ref name cannot contain '//': {name}"
        )));
    }
    if name.contains('\0') {
        return Err(Error::InvalidRef(format!(
            "ref name cannot contain null byte: {name}"
        )));
    }
    for component in name.split('/') {
        if component == "." || component == ".." {
            return Err(Error::InvalidRef(format!(
                "ref name cannot contain '.' or '..': {name}"
            )));
        }
    }
    Ok(())
}
