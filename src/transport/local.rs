use std::fs;

use crate::error::{IoResultExt, Result};
use crate::hash::ObjectId;
use crate::object::object_path;
use crate::repo::Repository;

/// counts of a finished transfer
#[derive(Debug, Default, Clone)]
pub struct TransferStats {
    pub copied: usize,
    pub skipped: usize,
    pub bytes_transferred: u64,
}

/// copy one object file between repositories
///
/// the compressed frame is copied byte for byte, so the id is identical
/// on both sides. an object already present is skipped.
pub fn copy_object(
    src: &Repository,
    dst: &Repository,
    id: &ObjectId,
    stats: &mut TransferStats,
) -> Result<()> {
    let src_path = object_path(src, id);
    let dst_path = object_path(dst, id);

    if dst_path.exists() {
        stats.skipped += 1;
        return Ok(());
    }

    if let Some(parent) = dst_path.parent() {
        fs::create_dir_all(parent).with_path(parent)?;
    }

    let bytes = fs::copy(&src_path, &dst_path).with_path(&src_path)?;
    stats.copied += 1;
    stats.bytes_transferred += bytes;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{object_exists, read_blob, write_blob};
    use tempfile::tempdir;

    fn test_repo(dir: &tempfile::TempDir, name: &str) -> Repository {
        Repository::init(&dir.path().join(name)).unwrap()
    }

    #[test]
    fn test_copy_object() {
        let dir = tempdir().unwrap();
        let src = test_repo(&dir, "src");
        let dst = test_repo(&dir, "dst");

        let id = write_blob(&src, b"payload").unwrap();

        let mut stats = TransferStats::default();
        copy_object(&src, &dst, &id, &mut stats).unwrap();

        assert_eq!(stats.copied, 1);
        assert!(object_exists(&dst, &id));
        assert_eq!(read_blob(&dst, &id).unwrap(), b"payload");

        // identical bytes on both sides
        let src_bytes = fs::read(object_path(&src, &id)).unwrap();
        let dst_bytes = fs::read(object_path(&dst, &id)).unwrap();
        assert_eq!(src_bytes, dst_bytes);
    }

    #[test]
    fn test_copy_skips_existing() {
        let dir = tempdir().unwrap();
        let src = test_repo(&dir, "src");
        let dst = test_repo(&dir, "dst");

        let id = write_blob(&src, b"payload").unwrap();
        write_blob(&dst, b"payload").unwrap();

        let mut stats = TransferStats::default();
        copy_object(&src, &dst, &id, &mut stats).unwrap();

        assert_eq!(stats.copied, 0);
        assert_eq!(stats.skipped, 1);
    }
}
