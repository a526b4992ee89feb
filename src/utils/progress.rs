//! Progress bar utilities using indicatif
//!
//! Tracks how many input files have finished. indicatif hides the bar
//! automatically when stderr is not a terminal.
//!
//! Log output must not tear the bar, so the logging subscriber writes
//! through [`LogWriter`], which prints above the bar while one is active.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};
use std::io::{self, Write};
use std::sync::Mutex;

/// Bar currently drawing on stderr, if any
static ACTIVE_BAR: Mutex<Option<IndicatifBar>> = Mutex::new(None);

fn active_bar() -> Option<IndicatifBar> {
    ACTIVE_BAR.lock().ok().and_then(|bar| bar.clone())
}

fn set_active_bar(bar: Option<IndicatifBar>) {
    if let Ok(mut active) = ACTIVE_BAR.lock() {
        *active = bar;
    }
}

/// Progress bar wrapper for displaying processing status
pub struct ProgressBar {
    bar: IndicatifBar,
}

impl ProgressBar {
    /// Create a new progress bar with known total
    pub fn new(total: usize, label: &str) -> Self {
        let bar = IndicatifBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} files ({elapsed})")
                .expect("Invalid progress bar template")
                .progress_chars("█░"),
        );
        bar.set_message(label.to_string());
        set_active_bar(Some(bar.clone()));

        Self { bar }
    }

    /// Increment progress by 1
    pub fn inc(&self) {
        self.bar.inc(1);
    }

    /// Finish with custom message
    pub fn finish_with_message(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
        set_active_bar(None);
    }
}

impl Drop for ProgressBar {
    fn drop(&mut self) {
        set_active_bar(None);
    }
}

/// stderr writer that suspends the active progress bar around each write.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match active_bar() {
            Some(bar) => bar.suspend(|| io::stderr().write(buf)),
            None => io::stderr().write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match active_bar() {
            Some(bar) => bar.suspend(|| io::stderr().write_all(buf)),
            None => io::stderr().write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}
