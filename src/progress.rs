// src/progress.rs

//! Progress feedback for the probe and apply phases.
//!
//! The spinner ticks on a background thread owned by indicatif; it has no
//! effect on ordering or outcome and is finished deterministically when the
//! step it decorates completes.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub trait ProgressTracker {
    fn set_message(&self, message: &str);
    fn finish(&self);
}

/// Visual spinner for interactive runs.
pub struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

impl ProgressTracker for SpinnerProgress {
    fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for SpinnerProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// No-op tracker for scripted or quiet runs.
pub struct SilentProgress;

impl ProgressTracker for SilentProgress {
    fn set_message(&self, _message: &str) {}
    fn finish(&self) {}
}
