use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use lfs_transfer::{logging, CheckoutFilter, Component, Config};
use std::io::{self, Read, Write};
use std::path::PathBuf;

/// Git LFS smudge filter resolving pointers from a local content-addressed store
#[derive(Parser, Default)]
#[command(name = "lfs-smudge")]
#[command(about = "Replace an LFS pointer on stdin with its object on stdout", long_about = None)]
#[command(version)]
struct Cli {
    /// Path of the file being checked out (git's %f), for diagnostics only
    file: Option<PathBuf>,

    /// Store root directory (defaults to LFS_STORAGE_DIR env var or /tmp/lfs_storage)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Don't write the diagnostic log
    #[arg(long)]
    no_log: bool,
}

// Always exits 0: a failed smudge must not fail the checkout.
fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            eprintln!("lfs-smudge: {}", e);
            Cli::default()
        }
    };

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "smudge failed");
        eprintln!("lfs-smudge: {:#}", e);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env(Component::Smudge);
    if let Some(root) = cli.root {
        config = config.with_storage_root(root);
    }
    if cli.no_log {
        config = config.without_log();
    }

    logging::init(&config);
    if let Some(file) = &cli.file {
        tracing::debug!(file = %file.display(), "smudging");
    }

    let mut input = Vec::new();
    io::stdin()
        .read_to_end(&mut input)
        .context("failed to read pointer from stdin")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut err = io::stderr();
    let outcome = CheckoutFilter::new(&config).smudge(&input, &mut out, &mut err)?;
    out.flush()?;
    tracing::debug!(?outcome, "smudge finished");

    Ok(())
}
