//! # restore-mtime
//!
//! Put recorded modification times back onto files whose content is unchanged.
//!
//! ## Usage
//! ```bash
//! restore-mtime path/to/tree file_info.json
//!
//! # See what would change without touching anything
//! restore-mtime path/to/tree file_info.json --dry-run
//! ```

mod common;

use clap::Parser;
use colored::*;
use mtimekeeper::{Manifest, Restorer, Result};
use std::path::PathBuf;

/// Restore modification times from a manifest
#[derive(Parser)]
#[command(name = "restore-mtime")]
#[command(version)]
#[command(about = "Restore file modification times where content still matches")]
#[command(long_about = None)]
struct Cli {
    /// Directory to restore into
    root: PathBuf,

    /// Manifest written by save-mtime
    manifest: PathBuf,

    /// Check everything but do not change timestamps
    #[arg(long)]
    dry_run: bool,

    /// Process files on all cores
    #[arg(long)]
    parallel: bool,

    /// Show progress
    #[arg(long)]
    progress: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    common::init_output(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let manifest = Manifest::load(&cli.manifest)?;

    let mut restorer = Restorer::new(&cli.root)
        .dry_run(cli.dry_run)
        .parallel(cli.parallel);

    let progress = if cli.progress {
        let pb = common::bar(manifest.len());
        restorer = restorer.with_progress(common::progress_callback(&pb));
        Some(pb)
    } else {
        None
    };

    let report = restorer.run(&manifest);

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    for (path, reason) in report.errors() {
        eprintln!("{} {}: {}", "✗".red().bold(), path, reason);
    }

    let verb = if report.dry_run { "Would update" } else { "Updated files" };
    println!("Parsed file infos: {}", report.total_entries.to_string().cyan());
    println!("{}: {}", verb, report.updated_count.to_string().green());
    println!("  Content changed: {}", report.skipped_mismatch());
    println!("  Missing: {}", report.skipped_missing());
    println!("  Time: {}", common::elapsed(report.duration_ms).cyan());

    Ok(())
}
