//! indicatif progress for response bodies: a bar when the length is known,
//! a spinner otherwise. Drawn on stderr and cleared when the body is done.

use fanprobe_core::progress::{BodyProgress, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct BarReporter;

impl ProgressReporter for BarReporter {
    fn begin(&self, index: usize, len: Option<u64>) -> Box<dyn BodyProgress> {
        let progress = match len {
            Some(total) => {
                let pb = ProgressBar::new(total);
                pb.set_style(
                    ProgressStyle::with_template(
                        "{prefix} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {bytes_per_sec}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
                );
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::with_template("{prefix} {spinner:.cyan} {bytes} {bytes_per_sec}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
        };
        progress.set_prefix(format!("{:2}", index));
        Box::new(BodyBar(progress))
    }
}

struct BodyBar(ProgressBar);

impl BodyProgress for BodyBar {
    fn advance(&self, bytes: u64) {
        self.0.inc(bytes);
    }

    fn finish(&self) {
        self.0.finish_and_clear();
    }
}
