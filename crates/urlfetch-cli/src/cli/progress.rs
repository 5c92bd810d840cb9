//! Terminal progress bar for file downloads.

use indicatif::{ProgressBar, ProgressStyle};
use urlfetch_core::progress::ProgressObserver;

/// Progress observer that draws an indicatif bar (or a spinner when the size is unknown).
pub(crate) struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub(crate) fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl ProgressObserver for BarProgress {
    fn begin(&self, label: &str, total: Option<u64>) {
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        match total {
            Some(len) => {
                self.bar.set_length(len);
                self.bar.set_style(
                    ProgressStyle::with_template("{msg}\n{bar:40} {bytes}/{total_bytes} ({eta})")
                        .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
            }
            None => {
                self.bar.set_style(
                    ProgressStyle::with_template("{spinner} {msg} {bytes}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
            }
        }
        self.bar.set_message(label.to_string());
    }

    fn advance(&self, transferred: u64) {
        self.bar.set_position(transferred);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
