//! Spinner shown while Maven runs.
//!
//! Only drawn when stderr is an interactive terminal and neither `--json`
//! nor `--quiet` was given.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{IsTerminal, stderr};
use std::time::Duration;

/// Should progress be drawn at all?
#[must_use]
pub fn should_show_progress(json: bool, quiet: bool) -> bool {
    !json && !quiet && stderr().is_terminal()
}

/// Spinner with `message`; hidden unless `show`.
#[must_use]
pub fn create_spinner(message: &str, show: bool) -> ProgressBar {
    let pb = ProgressBar::new_spinner();

    if show {
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
    } else {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }

    pb
}
