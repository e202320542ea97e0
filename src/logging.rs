//! Diagnostic logging.
//!
//! stdout belongs to the protocol (or to the smudged content), and git shows
//! stderr to the user, so diagnostics go to an append-only file under the
//! storage root instead.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::Config;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "debug";

/// Install the global subscriber writing to `config.log_file`.
///
/// Returns `false`, leaving logging off, when the log is disabled or the
/// file cannot be opened.
pub fn init(config: &Config) -> bool {
    let Some(path) = config.log_file.as_deref() else {
        return false;
    };
    let Ok(file) = open_log(path) else {
        return false;
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .is_ok()
}

fn open_log(path: &Path) -> std::io::Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Component;
    use tempfile::TempDir;

    #[test]
    fn test_disabled_log_installs_nothing() {
        let config = Config::new("/nonexistent", Component::Transfer).without_log();
        assert!(!init(&config));
    }

    #[test]
    fn test_open_log_appends() {
        let td = TempDir::new().unwrap();
        let path = td.path().join("store").join("transfer.log");

        std::io::Write::write_all(&mut open_log(&path).unwrap(), b"one\n").unwrap();
        std::io::Write::write_all(&mut open_log(&path).unwrap(), b"two\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }
}
