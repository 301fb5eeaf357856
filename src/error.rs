use std::path::PathBuf;

use crate::hash::{Kind, ObjectId};

/// error type for ugit operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not a ugit repository (or any parent up to filesystem root): {0}")]
    NotARepository(PathBuf),

    #[error("target exists and is not empty: {0}")]
    AlreadyExists(PathBuf),

    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("ref not found: {0}")]
    RefNotFound(String),

    #[error("corrupt object {id}: {reason}")]
    Corrupt { id: ObjectId, reason: String },

    #[error("expected {expected} object, found {actual}: {id}")]
    KindMismatch {
        id: ObjectId,
        expected: Kind,
        actual: Kind,
    },

    #[error("unknown name: {0}")]
    UnknownName(String),

    #[error("push rejected: {refname} on remote is not an ancestor of the local commit")]
    NonFastForward { refname: String },

    #[error("index is busy: another scoped acquisition is active")]
    Busy,

    #[error("invalid ref name or value: {0}")]
    InvalidRef(String),

    #[error("invalid tree entry name: {0}")]
    InvalidEntryName(String),

    #[error("duplicate tree entry name: {0}")]
    DuplicateEntryName(String),

    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("external tool {tool} failed: {message}")]
    ExternalTool { tool: &'static str, message: String },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("index serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
