use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use tracing::debug;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::{frame, hash_object, Kind, ObjectId};
use crate::repo::Repository;
use crate::types::{Commit, Tree};

/// write an object to the store
///
/// the frame (kind, length, payload) is zlib compressed and stored under
/// `objects/{id[..2]}/{id[2..]}`. writing an id that is already present
/// is a no-op; the bytes on disk never change once written.
pub fn write_object(repo: &Repository, kind: Kind, payload: &[u8]) -> Result<ObjectId> {
    let id = hash_object(kind, payload);

    let (dir, file) = id.to_path_components();
    let object_dir = repo.objects_path().join(&dir);
    let object_path = object_dir.join(&file);

    // deduplication: if the object already exists, we're done
    if object_path.exists() {
        return Ok(id);
    }

    let framed = frame(kind, payload);
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&framed).with_path(&object_path)?;
    let compressed = encoder.finish().with_path(&object_path)?;

    fs::create_dir_all(&object_dir).with_path(&object_dir)?;

    // atomic write: temp -> fsync -> rename
    let tmp_path = repo.tmp_path().join(uuid::Uuid::new_v4().to_string());
    {
        let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
        tmp_file.write_all(&compressed).with_path(&tmp_path)?;
        tmp_file.sync_all().with_path(&tmp_path)?;
    }

    fs::rename(&tmp_path, &object_path).with_path(&object_path)?;
    fsync_dir(&object_dir)?;

    debug!(%id, kind = %kind, bytes = payload.len(), "stored object");

    Ok(id)
}

/// read an object from the store
///
/// decompresses and parses the frame, verifying the declared length
/// against the payload. when `expected` is given, the kind must match.
pub fn read_object(
    repo: &Repository,
    id: &ObjectId,
    expected: Option<Kind>,
) -> Result<(Kind, Vec<u8>)> {
    let path = object_path(repo, id);

    let compressed = fs::read(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ObjectNotFound(*id)
        } else {
            Error::Io { path, source: e }
        }
    })?;

    let mut framed = Vec::new();
    ZlibDecoder::new(&compressed[..])
        .read_to_end(&mut framed)
        .map_err(|e| Error::Corrupt {
            id: *id,
            reason: format!("zlib decode failed: {e}"),
        })?;

    let (kind, payload) = parse_frame(*id, &framed)?;

    if let Some(expected) = expected {
        if kind != expected {
            return Err(Error::KindMismatch {
                id: *id,
                expected,
                actual: kind,
            });
        }
    }

    Ok((kind, payload))
}

/// split a decompressed frame into kind and payload, checking the length
fn parse_frame(id: ObjectId, framed: &[u8]) -> Result<(Kind, Vec<u8>)> {
    let corrupt = |reason: String| Error::Corrupt { id, reason };

    let space = framed
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| corrupt("no space in frame header".to_string()))?;
    let nul = framed[space..]
        .iter()
        .position(|&b| b == 0)
        .map(|i| space + i)
        .ok_or_else(|| corrupt("no NUL in frame header".to_string()))?;

    let kind = std::str::from_utf8(&framed[..space])
        .ok()
        .and_then(|s| s.parse::<Kind>().ok())
        .ok_or_else(|| corrupt("unknown object kind in frame".to_string()))?;

    let declared: usize = std::str::from_utf8(&framed[space + 1..nul])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| corrupt("bad length field in frame".to_string()))?;

    let payload = &framed[nul + 1..];
    if payload.len() != declared {
        return Err(corrupt(format!(
            "length mismatch: header says {declared}, payload is {}",
            payload.len()
        )));
    }

    Ok((kind, payload.to_vec()))
}

/// get the filesystem path of an object
pub fn object_path(repo: &Repository, id: &ObjectId) -> PathBuf {
    let (dir, file) = id.to_path_components();
    repo.objects_path().join(dir).join(file)
}

/// check if an object exists in the store
pub fn object_exists(repo: &Repository, id: &ObjectId) -> bool {
    object_path(repo, id).exists()
}

/// write a blob
pub fn write_blob(repo: &Repository, content: &[u8]) -> Result<ObjectId> {
    write_object(repo, Kind::Blob, content)
}

/// read a blob's content
pub fn read_blob(repo: &Repository, id: &ObjectId) -> Result<Vec<u8>> {
    let (_, payload) = read_object(repo, id, Some(Kind::Blob))?;
    Ok(payload)
}

/// write a tree
pub fn write_tree(repo: &Repository, tree: &Tree) -> Result<ObjectId> {
    write_object(repo, Kind::Tree, &tree.to_payload())
}

/// read and parse a tree
pub fn read_tree(repo: &Repository, id: &ObjectId) -> Result<Tree> {
    let (_, payload) = read_object(repo, id, Some(Kind::Tree))?;
    Tree::parse(*id, &payload)
}

/// write a commit
pub fn write_commit(repo: &Repository, commit: &Commit) -> Result<ObjectId> {
    write_object(repo, Kind::Commit, &commit.to_payload())
}

/// read and parse a commit
pub fn read_commit(repo: &Repository, id: &ObjectId) -> Result<Commit> {
    let (_, payload) = read_object(repo, id, Some(Kind::Commit))?;
    Commit::parse(*id, &payload)
}

/// fsync a directory
fn fsync_dir(path: &Path) -> Result<()> {
    let dir = File::open(path).with_path(path)?;
    dir.sync_all().with_path(path)?;
    Ok(())
}
