use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::Error;

/// SHA-1 object id used for content addressing
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 20]);

impl ObjectId {
    /// create from raw bytes
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// parse from hex string
    ///
    /// accepts either case; the id is held in canonical (lowercase) form.
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        let bytes = hex::decode(s).map_err(|_| Error::InvalidObjectId(s.to_string()))?;
        if bytes.len() != 20 {
            return Err(Error::InvalidObjectId(s.to_string()));
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// get raw bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// convert to lowercase hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// split into path components for the object store
    /// returns (first 2 hex chars, remaining 38 hex chars)
    pub fn to_path_components(&self) -> (String, String) {
        let hex = self.to_hex();
        (hex[..2].to_string(), hex[2..].to_string())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", &self.to_hex()[..10])
    }
}

impl Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// kind of object held in the store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Blob,
    Tree,
    Commit,
}

impl Kind {
    /// the kind tag as it appears in the object frame
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Blob => "blob",
            Kind::Tree => "tree",
            Kind::Commit => "commit",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blob" => Ok(Kind::Blob),
            "tree" => Ok(Kind::Tree),
            "commit" => Ok(Kind::Commit),
            _ => Err(()),
        }
    }
}

/// build the framed representation of an object
///
/// frame = kind tag, single space, decimal payload length, NUL, payload.
/// the id is the SHA-1 of exactly these bytes, and the same bytes (zlib
/// compressed) are what the store keeps on disk.
pub fn frame(kind: Kind, payload: &[u8]) -> Vec<u8> {
    let header = format!("{} {}", kind.as_str(), payload.len());
    let mut framed = Vec::with_capacity(header.len() + 1 + payload.len());
    framed.extend_from_slice(header.as_bytes());
    framed.push(0);
    framed.extend_from_slice(payload);
    framed
}

/// compute the object id for (kind, payload)
///
/// pure: depends only on its inputs.
pub fn hash_object(kind: Kind, payload: &[u8]) -> ObjectId {
    let digest = Sha1::digest(frame(kind, payload));
    ObjectId(digest.into())
}
