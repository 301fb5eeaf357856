use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::graph::reachable_objects;
use crate::refs::{self, RefValue};
use crate::repo::Repository;
use crate::transport::local::{copy_object, TransferStats};

const REMOTE_HEADS_BASE: &str = "refs/heads/";
const LOCAL_REMOTE_BASE: &str = "refs/remote/";

/// fetch branches and their objects from a peer repository
///
/// every object reachable from the peer's `refs/heads/` is copied if
/// absent locally; each remote branch then lands under
/// `refs/remote/{name}`.
pub fn fetch(repo: &Repository, remote_path: &Path) -> Result<TransferStats> {
    let remote = Repository::open(remote_path)?;

    let heads = refs::iter_refs(&remote, REMOTE_HEADS_BASE, true)?;

    let mut seeds = Vec::new();
    for (_, value) in &heads {
        seeds.push(value.id()?);
    }

    let mut stats = TransferStats::default();
    for id in reachable_objects(&remote, seeds)? {
        copy_object(&remote, repo, &id, &mut stats)?;
    }

    for (name, value) in &heads {
        if let Some(short) = name.strip_prefix(REMOTE_HEADS_BASE) {
            refs::update_ref(
                repo,
                &format!("{LOCAL_REMOTE_BASE}{short}"),
                &RefValue::direct(value.id()?),
                true,
            )?;
        }
    }

    debug!(
        copied = stats.copied,
        skipped = stats.skipped,
        "fetched from peer"
    );

    Ok(stats)
}
