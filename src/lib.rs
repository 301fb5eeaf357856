//! ugit - content-addressed version control engine
//!
//! stores file trees and their history as immutable SHA-1-addressed
//! objects under a per-repository `.ugit` directory, with git-like
//! semantics: snapshots, branches, tags, merges, and object exchange
//! with peer repositories on the same filesystem.
//!
//! # Core concepts
//!
//! - **Blob**: raw file contents, zlib compressed on disk
//! - **Tree**: one directory level, sorted `kind id name` records
//! - **Commit**: a tree snapshot with parent edges and a message
//! - **Ref**: a named pointer, direct (an id) or symbolic (`ref: ...`)
//! - **Index**: the staging map from path to blob id
//!
//! # Addressing
//!
//! object id = SHA1(kind | ' ' | ascii(len) | NUL | payload)
//!
//! the same framed bytes, zlib compressed, are the on-disk
//! representation; identical content is stored once.
//!
//! # Example usage
//!
//! ```no_run
//! use std::path::Path;
//! use ugit::{ops, Repository};
//!
//! // initialize a repository
//! let repo = Repository::init(Path::new("/path/to/project")).unwrap();
//!
//! // stage a file and record a snapshot
//! ops::add(&repo, &["notes.txt".into()]).unwrap();
//! let id = ops::create_commit(&repo, "initial commit").unwrap();
//!
//! // walk history
//! for entry in ops::log(&repo, id).unwrap() {
//!     println!("{entry}");
//! }
//! ```

mod config;
mod error;
mod hash;
mod index;
mod repo;
mod snapshot;

pub mod diff;
pub mod graph;
pub mod object;
pub mod ops;
pub mod refs;
pub mod transport;
pub mod types;
pub mod worktree;

pub use config::Config;
pub use error::{Error, IoResultExt, Result};
pub use hash::{hash_object, Kind, ObjectId};
pub use index::{index_in_use, load_index, IndexEntries, IndexTransaction};
pub use repo::{Repository, DATA_DIR};
pub use snapshot::{write_snapshot_tree, write_tree_from_index, write_tree_from_worktree};
