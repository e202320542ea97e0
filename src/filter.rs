//! Checkout (smudge) filter.
//!
//! Git runs the filter once per file it materializes, with the pointer
//! text on stdin, and writes whatever comes out of stdout into the working
//! tree. When the object can't be resolved the pointer itself is written
//! back, so a checkout never produces an empty file.

use std::io::{self, Read, Write};

use tracing::{debug, warn};

use crate::store::ObjectStore;
use crate::{Config, Oid, Pointer, Result};

/// What the filter did with its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmudgeOutcome {
    /// Smudging is switched off; input copied through.
    Bypassed,
    /// No usable `oid sha256:` line; input copied through.
    NoOid,
    /// Object written in place of the pointer.
    Resolved {
        /// The resolved object.
        oid: Oid,
        /// Bytes written.
        bytes: u64,
    },
    /// Object not in the store; pointer copied through.
    Missing {
        /// The object that was looked for.
        oid: Oid,
    },
}

impl SmudgeOutcome {
    /// Check if the output is the unchanged input.
    pub fn is_passthrough(&self) -> bool {
        !matches!(self, SmudgeOutcome::Resolved { .. })
    }
}

/// Resolves pointer text to object content.
pub struct CheckoutFilter<'a> {
    config: &'a Config,
    store: ObjectStore,
}

impl<'a> CheckoutFilter<'a> {
    /// Create a filter reading from the store named by `config`.
    pub fn new(config: &'a Config) -> Self {
        CheckoutFilter {
            config,
            store: ObjectStore::new(&config.storage_root),
        }
    }

    /// Smudge one file.
    ///
    /// `out` receives either the object or `input` verbatim; diagnostics
    /// for the user go to `err`. An object that can't be read is treated
    /// as missing as long as none of it has been written yet. Errors are
    /// returned only once `out` holds part of the object, or when writing
    /// `out` or `err` fails.
    pub fn smudge<W: Write, E: Write>(
        &self,
        input: &[u8],
        out: &mut W,
        err: &mut E,
    ) -> Result<SmudgeOutcome> {
        if self.config.skip_smudge {
            debug!("smudge skipped");
            out.write_all(input)?;
            return Ok(SmudgeOutcome::Bypassed);
        }

        let text = String::from_utf8_lossy(input);
        let oid = match Pointer::find_oid(&text).map(Oid::parse) {
            Some(Ok(oid)) => oid,
            parsed => {
                if let Some(Err(e)) = parsed {
                    warn!(error = %e, "unusable oid in pointer");
                } else {
                    warn!("no oid in pointer");
                }
                passthrough(input, out, err, "No OID found in pointer file.")?;
                return Ok(SmudgeOutcome::NoOid);
            }
        };

        let object = match self.store.open(&oid) {
            Ok(file) => file,
            Err(e) => {
                warn!(oid = %oid, error = %e, "object unavailable");
                return missing(oid, input, out, err);
            }
        };

        let outcome = stream_object(oid, object, input, out, err)?;
        if let SmudgeOutcome::Resolved { oid, bytes } = &outcome {
            let stated = Pointer::parse(input).ok().and_then(|p| p.size());
            if stated.is_some_and(|size| size != *bytes) {
                warn!(oid = %oid, bytes, stated = ?stated, "object size differs from pointer");
            }
        }
        Ok(outcome)
    }
}

fn stream_object<R: Read, W: Write, E: Write>(
    oid: Oid,
    mut object: R,
    input: &[u8],
    out: &mut W,
    err: &mut E,
) -> Result<SmudgeOutcome> {
    let mut buf = vec![0u8; 64 * 1024];
    let mut bytes = 0u64;
    loop {
        let n = match object.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if bytes == 0 => {
                warn!(oid = %oid, error = %e, "object unreadable");
                return missing(oid, input, out, err);
            }
            Err(e) => return Err(e.into()),
        };
        out.write_all(&buf[..n])?;
        bytes += n as u64;
    }

    out.flush()?;
    debug!(oid = %oid, bytes, "wrote object to stdout");
    Ok(SmudgeOutcome::Resolved { oid, bytes })
}

fn missing<W: Write, E: Write>(
    oid: Oid,
    input: &[u8],
    out: &mut W,
    err: &mut E,
) -> Result<SmudgeOutcome> {
    passthrough(input, out, err, &format!("Missing object: {}", oid))?;
    Ok(SmudgeOutcome::Missing { oid })
}

fn passthrough<W: Write, E: Write>(
    input: &[u8],
    out: &mut W,
    err: &mut E,
    diagnostic: &str,
) -> Result<()> {
    writeln!(err, "{}", diagnostic)?;
    out.write_all(input)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Component;
    use std::fs;
    use tempfile::TempDir;

    fn run(config: &Config, input: &[u8]) -> (SmudgeOutcome, Vec<u8>, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let outcome = CheckoutFilter::new(config)
            .smudge(input, &mut out, &mut err)
            .unwrap();
        (outcome, out, String::from_utf8(err).unwrap())
    }

    fn config(td: &TempDir) -> Config {
        Config::new(td.path(), Component::Smudge).without_log()
    }

    #[test]
    fn test_resolves_flat_object() {
        let td = TempDir::new().unwrap();
        let config = config(&td);
        let content = b"\x00\x01binary payload\xff";
        let pointer = Pointer::from_content(content);
        fs::write(td.path().join(pointer.oid().as_str()), content).unwrap();

        let (outcome, out, err) = run(&config, pointer.encode().as_bytes());
        assert_eq!(
            outcome,
            SmudgeOutcome::Resolved {
                oid: pointer.oid().clone(),
                bytes: content.len() as u64
            }
        );
        assert_eq!(out, content);
        assert!(err.is_empty());
    }

    #[test]
    fn test_resolves_sharded_object() {
        let td = TempDir::new().unwrap();
        let config = config(&td);
        let content = b"uploaded through the agent";
        let pointer = Pointer::from_content(content);
        ObjectStore::new(td.path())
            .put_bytes(pointer.oid(), content)
            .unwrap();

        let (outcome, out, _) = run(&config, pointer.encode().as_bytes());
        assert!(!outcome.is_passthrough());
        assert_eq!(out, content);
    }

    #[test]
    fn test_missing_object_passes_pointer_through() {
        let td = TempDir::new().unwrap();
        let config = config(&td);
        let pointer = Pointer::from_content(b"never stored").encode();

        let (outcome, out, err) = run(&config, pointer.as_bytes());
        assert!(matches!(outcome, SmudgeOutcome::Missing { .. }));
        assert_eq!(out, pointer.as_bytes());
        assert!(err.starts_with("Missing object: "));
    }

    #[test]
    fn test_no_oid_line_passes_through() {
        let td = TempDir::new().unwrap();
        let config = config(&td);
        let input = b"version https://git-lfs.github.com/spec/v1\nsize 12\n";

        let (outcome, out, err) = run(&config, input);
        assert_eq!(outcome, SmudgeOutcome::NoOid);
        assert_eq!(out, input);
        assert_eq!(err, "No OID found in pointer file.\n");
    }

    #[test]
    fn test_malformed_oid_passes_through() {
        let td = TempDir::new().unwrap();
        let config = config(&td);
        let input = b"oid sha256:../../../etc/passwd\n";

        let (outcome, out, _) = run(&config, input);
        assert_eq!(outcome, SmudgeOutcome::NoOid);
        assert_eq!(out, input);
    }

    #[test]
    fn test_bypass_ignores_store() {
        let td = TempDir::new().unwrap();
        let mut config = config(&td);
        config.skip_smudge = true;
        let content = b"present in store";
        let pointer = Pointer::from_content(content);
        fs::write(td.path().join(pointer.oid().as_str()), content).unwrap();

        let input = pointer.encode();
        let (outcome, out, err) = run(&config, input.as_bytes());
        assert_eq!(outcome, SmudgeOutcome::Bypassed);
        assert_eq!(out, input.as_bytes());
        assert!(err.is_empty());
    }

    /// Yields `good` bytes, then fails every read.
    struct FailingReader {
        good: &'static [u8],
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.good.is_empty() {
                return Err(io::Error::new(io::ErrorKind::Other, "disk went away"));
            }
            let n = self.good.len().min(buf.len());
            buf[..n].copy_from_slice(&self.good[..n]);
            self.good = &self.good[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_unreadable_object_passes_pointer_through() {
        let pointer = Pointer::from_content(b"stored but unreadable");
        let input = pointer.encode();
        let mut out = Vec::new();
        let mut err = Vec::new();

        let reader = FailingReader { good: b"" };
        let outcome = stream_object(
            pointer.oid().clone(),
            reader,
            input.as_bytes(),
            &mut out,
            &mut err,
        )
        .unwrap();

        assert_eq!(
            outcome,
            SmudgeOutcome::Missing {
                oid: pointer.oid().clone()
            }
        );
        assert_eq!(out, input.as_bytes());
        assert_eq!(
            String::from_utf8(err).unwrap(),
            format!("Missing object: {}\n", pointer.oid())
        );
    }

    #[test]
    fn test_read_failure_after_output_is_an_error() {
        let pointer = Pointer::from_content(b"half of this");
        let mut out = Vec::new();
        let mut err = Vec::new();

        let reader = FailingReader { good: b"half" };
        let result = stream_object(
            pointer.oid().clone(),
            reader,
            pointer.encode().as_bytes(),
            &mut out,
            &mut err,
        );

        assert!(matches!(result, Err(crate::Error::Io(_))));
        assert_eq!(out, b"half");
        assert!(err.is_empty());
    }

    #[test]
    fn test_size_mismatch_still_resolves() {
        let td = TempDir::new().unwrap();
        let config = config(&td);
        let content = b"actual bytes";
        let oid = Oid::from_content(content);
        fs::write(td.path().join(oid.as_str()), content).unwrap();

        // Pointer claims a different size than what is stored
        let input = Pointer::new(oid.clone(), 999).encode();
        let (outcome, out, _) = run(&config, input.as_bytes());
        assert_eq!(
            outcome,
            SmudgeOutcome::Resolved {
                oid,
                bytes: content.len() as u64
            }
        );
        assert_eq!(out, content);
    }
}
