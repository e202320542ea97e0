//! Process configuration.
//!
//! Built once at startup from the environment, adjusted from command-line
//! flags, then passed by reference to whichever component runs.

use std::env;
use std::path::{Path, PathBuf};

/// Default storage root.
pub const DEFAULT_STORAGE_DIR: &str = "/tmp/lfs_storage";

/// Environment variable naming the storage root.
pub const STORAGE_DIR_ENV: &str = "LFS_STORAGE_DIR";

/// Environment variable that turns the checkout filter into a passthrough.
pub const SKIP_SMUDGE_ENV: &str = "GIT_LFS_SKIP_SMUDGE";

/// Environment variable that disables the diagnostic log when set to `0`.
pub const LOG_ENV: &str = "LFS_TRANSFER_LOG";

/// Which binary is running; selects the log file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// The custom transfer agent.
    Transfer,
    /// The checkout filter.
    Smudge,
}

impl Component {
    /// Name of the component's log file under the storage root.
    pub fn log_file_name(self) -> &'static str {
        match self {
            Component::Transfer => "transfer.log",
            Component::Smudge => "smudge.log",
        }
    }
}

/// Runtime configuration shared by the transfer agent and checkout filter.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the content-addressed store.
    pub storage_root: PathBuf,
    /// git's local object cache, where downloads without a path land.
    pub lfs_objects_dir: PathBuf,
    /// Append-only diagnostic log, if enabled.
    pub log_file: Option<PathBuf>,
    /// Recompute the SHA-256 of uploaded content before storing it.
    pub verify_uploads: bool,
    /// Pass pointers through the checkout filter untouched.
    pub skip_smudge: bool,
}

impl Config {
    /// Create a configuration with defaults for the given storage root.
    pub fn new<P: AsRef<Path>>(storage_root: P, component: Component) -> Self {
        let storage_root = storage_root.as_ref().to_path_buf();
        Config {
            log_file: Some(storage_root.join(component.log_file_name())),
            lfs_objects_dir: lfs_objects_dir(Path::new(".git")),
            storage_root,
            verify_uploads: false,
            skip_smudge: false,
        }
    }

    /// Build the configuration from the process environment.
    pub fn from_env(component: Component) -> Self {
        Self::from_lookup(component, |key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(component: Component, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let root = lookup(STORAGE_DIR_ENV)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_STORAGE_DIR.to_string());

        let mut config = Config::new(root, component);
        if let Some(git_dir) = lookup("GIT_DIR").filter(|v| !v.is_empty()) {
            config.lfs_objects_dir = lfs_objects_dir(Path::new(&git_dir));
        }
        if lookup(LOG_ENV).as_deref() == Some("0") {
            config.log_file = None;
        }
        config.skip_smudge = lookup(SKIP_SMUDGE_ENV).as_deref() == Some("1");
        config
    }

    /// Move the store, keeping the log file alongside it.
    pub fn with_storage_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        if let Some(log) = &self.log_file {
            if let Some(name) = log.file_name() {
                self.log_file = Some(root.join(name));
            }
        }
        self.storage_root = root;
        self
    }

    /// Derive the local object cache from a git directory.
    pub fn with_git_dir<P: AsRef<Path>>(mut self, git_dir: P) -> Self {
        self.lfs_objects_dir = lfs_objects_dir(git_dir.as_ref());
        self
    }

    /// Disable the diagnostic log.
    pub fn without_log(mut self) -> Self {
        self.log_file = None;
        self
    }

    /// Enable hash verification of uploads.
    pub fn with_verify_uploads(mut self, verify: bool) -> Self {
        self.verify_uploads = verify;
        self
    }
}

fn lfs_objects_dir(git_dir: &Path) -> PathBuf {
    git_dir.join("lfs").join("objects")
}
