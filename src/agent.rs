//! The custom transfer agent.
//!
//! Reads one request per line, answers each with at most one line, and
//! keeps no state between requests apart from the configuration. Requests
//! are handled strictly in order; the response to one is flushed before
//! the next is read.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::protocol::{Operation, Request, Response};
use crate::store::ObjectStore;
use crate::{Config, Error, Oid, Result};

/// Where the agent is in a session.
///
/// `init` is acknowledged but not required: transfers are served in
/// either state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No `init` seen yet.
    AwaitingInit,
    /// `init` seen for this operation.
    Ready(Operation),
}

/// Transfer agent moving objects between local files and the store.
pub struct TransferAgent<'a> {
    config: &'a Config,
    store: ObjectStore,
    cache: ObjectStore,
    state: State,
}

impl<'a> TransferAgent<'a> {
    /// Create an agent for the store and local cache named by `config`.
    pub fn new(config: &'a Config) -> Self {
        TransferAgent {
            config,
            store: ObjectStore::new(&config.storage_root),
            cache: ObjectStore::new(&config.lfs_objects_dir),
            state: State::AwaitingInit,
        }
    }

    /// The current session state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The store objects are uploaded to and downloaded from.
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// Serve requests from `input` until it is exhausted or a `terminate`
    /// arrives.
    ///
    /// Lines that don't parse are logged and skipped. Only a failure to read
    /// the input or write the output ends the loop with an error.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> Result<()> {
        info!(root = %self.store.root().display(), "transfer agent started");

        let mut line = Vec::new();
        loop {
            line.clear();
            if input.read_until(b'\n', &mut line)? == 0 {
                debug!("input closed");
                break;
            }

            let raw = trim_line(&line);
            if raw.is_empty() {
                continue;
            }
            debug!(line = %String::from_utf8_lossy(raw), "read request");

            let request = match Request::from_line(raw) {
                Ok(request) => request,
                Err(e) => {
                    warn!(error = %e, "skipping malformed request");
                    continue;
                }
            };

            debug!(event = request.event(), "dispatching");
            if request == Request::Terminate {
                debug!("terminate received");
                break;
            }

            if let Some(response) = self.handle(request) {
                let encoded = response.to_line()?;
                debug!(line = %encoded.trim_end(), "sent response");
                output.write_all(encoded.as_bytes())?;
                output.flush()?;
            }
        }

        info!("transfer agent stopped");
        Ok(())
    }

    /// Answer a single request.
    ///
    /// Returns `None` for events that get no response.
    pub fn handle(&mut self, request: Request) -> Option<Response> {
        match request {
            Request::Init { operation } => {
                debug!(?operation, "init");
                self.state = State::Ready(operation);
                Some(Response::init(operation))
            }
            Request::Upload { oid, size, path } => Some(self.upload(&oid, size, &path)),
            Request::Download { oid, path, .. } => Some(self.download(&oid, path)),
            Request::Terminate => None,
            Request::Unknown => {
                warn!("unhandled event");
                None
            }
        }
    }

    fn upload(&self, oid: &str, size: u64, src: &Path) -> Response {
        debug!(oid, size, src = %src.display(), "upload");
        let result = Oid::parse(oid).and_then(|id| {
            self.store
                .put_file(&id, src, self.config.verify_uploads)
                .map(|_| ())
        });

        match result {
            Ok(()) => Response::uploaded(oid),
            Err(e) => failure(oid, e),
        }
    }

    fn download(&self, oid: &str, dest: Option<PathBuf>) -> Response {
        debug!(oid, dest = ?dest, "download");
        let result = Oid::parse(oid).and_then(|id| {
            let dest = dest.unwrap_or_else(|| self.cache.object_path(&id));
            self.store.copy_to(&id, &dest, false).map(|_| dest)
        });

        match result {
            Ok(dest) => Response::downloaded(oid, dest),
            Err(e) => failure(oid, e),
        }
    }
}

fn failure(oid: &str, err: Error) -> Response {
    warn!(oid, error = %err, "transfer failed");
    Response::error(oid, err.status_code(), err.to_string())
}

fn trim_line(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &line[..end]
}
