//! LFS Object ID (OID) - hex-encoded content hash.

use sha2::{Digest, Sha256};
use std::fmt;

use crate::{Error, Result};

/// Shortest OID that still has both sharding levels.
pub const MIN_OID_LEN: usize = 4;

/// Longest accepted OID (a SHA-512 in hex).
pub const MAX_OID_LEN: usize = 128;

/// LFS Object ID.
///
/// Held as the hex string the caller sent, so the derived paths match
/// what git-lfs computes for the same object. Only hex digits are
/// accepted, which keeps an OID from ever naming a path outside the
/// storage root.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Oid {
    hex: String,
}

impl Oid {
    /// Parse an OID from a hex string.
    pub fn parse(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        if hex.len() < MIN_OID_LEN || hex.len() > MAX_OID_LEN {
            return Err(Error::InvalidOid(format!(
                "expected {}-{} hex chars, got {}",
                MIN_OID_LEN,
                MAX_OID_LEN,
                hex.len()
            )));
        }
        if let Some(bad) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(Error::InvalidOid(format!("non-hex character {:?}", bad)));
        }
        Ok(Oid {
            hex: hex.to_string(),
        })
    }

    /// Compute the OID (SHA256 hash) of content.
    pub fn from_content(content: &[u8]) -> Self {
        Oid::from_digest(Sha256::digest(content).as_slice())
    }

    pub(crate) fn from_digest(digest: &[u8]) -> Self {
        Oid {
            hex: hex::encode(digest),
        }
    }

    /// Get the OID as a hex string.
    pub fn as_str(&self) -> &str {
        &self.hex
    }

    /// First sharding level (`oid[0:2]`).
    pub fn shard_outer(&self) -> &str {
        &self.hex[0..2]
    }

    /// Second sharding level (`oid[2:4]`).
    pub fn shard_inner(&self) -> &str {
        &self.hex[2..4]
    }

    /// Case-insensitive comparison, for checking a recomputed hash.
    pub fn matches(&self, other: &Oid) -> bool {
        self.hex.eq_ignore_ascii_case(&other.hex)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.hex)
    }
}

impl std::str::FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Oid::parse(s)
    }
}
