//! # lfs-transfer
//!
//! A Git LFS custom transfer agent and smudge filter backed by a plain
//! directory of content-addressed objects.
//!
//! This crate provides:
//! - The line-delimited JSON transfer protocol (`init`, `upload`, `download`)
//! - A content-addressed store using the git-lfs `<oid[0:2]>/<oid[2:4]>/<oid>` layout
//! - A checkout filter that turns pointers back into content
//! - LFS pointer file parsing and generation
//!
//! ## Example
//!
//! ```no_run
//! use std::io;
//! use lfs_transfer::{Component, Config, TransferAgent};
//!
//! let config = Config::from_env(Component::Transfer);
//! let mut agent = TransferAgent::new(&config);
//! agent.run(io::stdin().lock(), io::stdout().lock()).unwrap();
//! ```
//!
//! git-lfs is pointed at the binaries through its configuration:
//!
//! ```text
//! git config lfs.standalonetransferagent lfs-transfer
//! git config lfs.customtransfer.lfs-transfer.path lfs-transfer
//! git config filter.lfs.smudge "lfs-smudge %f"
//! ```

mod error;
mod oid;
mod pointer;

pub mod agent;
pub mod config;
pub mod filter;
pub mod logging;
pub mod protocol;
pub mod store;

pub use agent::TransferAgent;
pub use config::{Component, Config};
pub use error::{Error, Result};
pub use filter::{CheckoutFilter, SmudgeOutcome};
pub use oid::Oid;
pub use pointer::Pointer;
pub use protocol::{Operation, Request, Response};
pub use store::ObjectStore;
