//! Body-read progress hook.
//!
//! The dispatcher reports every chunk it copies to the output sink; the CLI
//! plugs in a progress bar, library callers and `--nobar` get [`NoProgress`].

/// Creates one [`BodyProgress`] per probe.
pub trait ProgressReporter: Send + Sync {
    /// Called once the response headers arrived. `len` is the content length
    /// when the server announced one (bar), `None` otherwise (spinner).
    fn begin(&self, index: usize, len: Option<u64>) -> Box<dyn BodyProgress>;
}

/// Progress of a single response body.
pub trait BodyProgress: Send {
    fn advance(&self, bytes: u64);
    fn finish(&self);
}

/// Reporter that shows nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn begin(&self, _index: usize, _len: Option<u64>) -> Box<dyn BodyProgress> {
        Box::new(NoProgress)
    }
}

impl BodyProgress for NoProgress {
    fn advance(&self, _bytes: u64) {}
    fn finish(&self) {}
}
