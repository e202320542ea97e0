//! Custom transfer agent messages.
//!
//! git-lfs talks to a custom transfer agent with one JSON object per line
//! on the agent's stdin and stdout. Each request carries an `event` tag;
//! each request gets at most one response.
//! See: https://github.com/git-lfs/git-lfs/blob/main/docs/custom-transfers.md

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::Result;

/// The only transfer adapter this agent offers.
pub const BASIC_TRANSFER: &str = "basic";

/// Direction announced by `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Download objects from the store.
    Download,
    /// Upload objects to the store.
    Upload,
}

/// A request read from the agent's stdin.
///
/// Fields not listed here are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum Request {
    /// Start of a session.
    Init {
        /// The direction of every transfer that follows.
        operation: Operation,
    },
    /// Copy a local file into the store.
    Upload {
        /// The OID of the object.
        oid: String,
        /// The size of the object in bytes.
        size: u64,
        /// The file holding the object's content.
        path: PathBuf,
    },
    /// Copy an object out of the store.
    Download {
        /// The OID of the object.
        oid: String,
        /// The size of the object in bytes.
        #[serde(default)]
        size: Option<u64>,
        /// Where to put the content; derived from the local cache if absent.
        #[serde(default)]
        path: Option<PathBuf>,
    },
    /// End of a session.
    Terminate,
    /// Any event this agent doesn't know.
    #[serde(other)]
    Unknown,
}

/// A response written to the agent's stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum Response {
    /// Acknowledges `init`.
    Init {
        /// Echo of the requested operation.
        operation: Operation,
        /// The transfer adapters supported.
        transfers: Vec<String>,
    },
    /// A transfer finished.
    Complete {
        /// The OID of the object.
        oid: String,
        /// Where a downloaded object was written.
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
    },
    /// A transfer failed.
    Error {
        /// The OID of the object.
        oid: String,
        /// HTTP-like status code.
        code: u16,
        /// Error message.
        message: String,
    },
}

impl Request {
    /// Parse one protocol line.
    pub fn from_line(line: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(line)?)
    }

    /// Event name, for logging.
    pub fn event(&self) -> &'static str {
        match self {
            Request::Init { .. } => "init",
            Request::Upload { .. } => "upload",
            Request::Download { .. } => "download",
            Request::Terminate => "terminate",
            Request::Unknown => "unknown",
        }
    }
}

impl Response {
    /// The `init` acknowledgement for an operation.
    pub fn init(operation: Operation) -> Self {
        Response::Init {
            operation,
            transfers: vec![BASIC_TRANSFER.to_string()],
        }
    }

    /// A successful upload.
    pub fn uploaded(oid: &str) -> Self {
        Response::Complete {
            oid: oid.to_string(),
            path: None,
        }
    }

    /// A successful download to `path`.
    pub fn downloaded(oid: &str, path: PathBuf) -> Self {
        Response::Complete {
            oid: oid.to_string(),
            path: Some(path),
        }
    }

    /// A failed transfer.
    pub fn error(oid: &str, code: u16, message: impl Into<String>) -> Self {
        Response::Error {
            oid: oid.to_string(),
            code,
            message: message.into(),
        }
    }

    /// Serialize as a newline-terminated protocol line.
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
