//! # save-mtime
//!
//! Snapshot a directory's file modification times into a manifest.
//!
//! ## Usage
//! ```bash
//! # Writes ./file_info.json
//! save-mtime path/to/tree
//!
//! # Choose where the manifest goes
//! save-mtime path/to/tree -o /tmp/tree-mtimes.json
//! ```

mod common;

use clap::Parser;
use colored::*;
use mtimekeeper::{Result, Snapshotter, DEFAULT_MANIFEST_NAME};
use std::path::PathBuf;

/// Record file content hashes and modification times
#[derive(Parser)]
#[command(name = "save-mtime")]
#[command(version)]
#[command(about = "Snapshot file modification times keyed by content hash")]
#[command(long_about = None)]
struct Cli {
    /// Directory to snapshot
    root: PathBuf,

    /// Manifest file to write
    #[arg(short, long, default_value = DEFAULT_MANIFEST_NAME)]
    output: PathBuf,

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
    let mut snapshotter = Snapshotter::new(&cli.root);

    let progress = if cli.progress {
        let pb = common::spinner("Hashing files...");
        snapshotter = snapshotter.with_progress(common::progress_callback(&pb));
        Some(pb)
    } else {
        None
    };

    let report = snapshotter.run();

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let report = report?;

    for warning in &report.warnings {
        if warning.is_error() {
            eprintln!("{} {}", "✗".red().bold(), warning);
        } else {
            println!("{} {}", "-".dimmed(), warning.to_string().dimmed());
        }
    }

    report.manifest.save(&cli.output)?;

    println!(
        "{} Processed {} files. File information saved to {}",
        "✓".green().bold(),
        report.files_processed().to_string().cyan(),
        cli.output.display()
    );
    if report.files_failed() > 0 {
        println!("  Unreadable: {}", report.files_failed().to_string().yellow());
    }
    println!("  Time: {}", common::elapsed(report.duration_ms).cyan());

    Ok(())
}
