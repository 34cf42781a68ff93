pub mod config;
pub mod error;
pub mod logging;

// Run pipeline, leaves first
pub mod url_model;
pub mod resolver;
pub mod stats;
pub mod expiry;
pub mod progress;
pub mod probe;
pub mod retry;
pub mod engine;

pub use config::ProbeConfig;
pub use engine::{run, RunReport};
pub use error::ProbeError;
pub use stats::{ProbeOutcome, ResultStats};
