use anyhow::{Context, Result};
use clap::Parser;
use lfs_transfer::{logging, Component, Config, TransferAgent};
use std::io;
use std::path::PathBuf;

/// Git LFS custom transfer agent backed by a local content-addressed store
#[derive(Parser)]
#[command(name = "lfs-transfer")]
#[command(about = "Git LFS custom transfer agent backed by a local content-addressed store", long_about = None)]
#[command(version)]
struct Cli {
    /// Store root directory (defaults to LFS_STORAGE_DIR env var or /tmp/lfs_storage)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Git directory whose lfs/objects receives downloads (defaults to GIT_DIR or .git)
    #[arg(long)]
    git_dir: Option<PathBuf>,

    /// Recompute the SHA-256 of uploads and reject mismatches
    #[arg(long)]
    verify: bool,

    /// Don't write the diagnostic log
    #[arg(long)]
    no_log: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI arg > environment > default
    let mut config = Config::from_env(Component::Transfer).with_verify_uploads(cli.verify);
    if let Some(root) = cli.root {
        config = config.with_storage_root(root);
    }
    if let Some(git_dir) = cli.git_dir {
        config = config.with_git_dir(git_dir);
    }
    if cli.no_log {
        config = config.without_log();
    }

    logging::init(&config);

    let stdin = io::stdin();
    let stdout = io::stdout();
    TransferAgent::new(&config)
        .run(stdin.lock(), stdout.lock())
        .context("transfer protocol stream failed")?;

    Ok(())
}
