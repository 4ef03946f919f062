//! Terminal plumbing shared by `save-mtime` and `restore-mtime`

// Each binary uses a subset of these
#![allow(dead_code)]

use indicatif::{ProgressBar, ProgressStyle};
use mtimekeeper::{ProgressCallback, ProgressInfo};
use std::sync::Arc;
use std::time::Duration;

/// Install the tracing subscriber and color settings
pub fn init_output(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }

    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }
}

/// Spinner for walks of unknown length
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Bar for runs with a known entry count
pub fn bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Forward library progress to a progress bar
pub fn progress_callback(pb: &ProgressBar) -> ProgressCallback {
    let pb = pb.clone();
    Arc::new(move |info: ProgressInfo| {
        pb.set_position(info.processed as u64);
        if let Some(item) = info.current_item {
            pb.set_message(item);
        }
    })
}

/// Human readable elapsed time
pub fn elapsed(duration_ms: u64) -> String {
    humantime::format_duration(Duration::from_millis(duration_ms)).to_string()
}
