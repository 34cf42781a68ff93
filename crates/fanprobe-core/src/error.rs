//! Fatal run errors.
//!
//! Anything here aborts the run before (or instead of) the retry loop. Per-probe
//! failures are counted, not raised; see [`crate::probe::ProbeFailure`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("unexpected empty url")]
    EmptyUrl,

    #[error("output pattern must contain % or be \"none\" or \"-\" (got {0:?})")]
    OutputPattern(String),

    #[error("bad url {url:?}: {reason}")]
    BadUrl { url: String, reason: String },

    #[error("unable to resolve port {0:?}")]
    Port(String),

    #[error("invalid extra header {0:?}, expecting Key: Value")]
    Header(String),

    #[error("unable to resolve {family} host {host}: {reason}")]
    Resolve {
        family: String,
        host: String,
        reason: String,
    },

    #[error("unable to read ip list {source_name}: {reason}")]
    IpList { source_name: String, reason: String },

    #[error("error creating request: {0}")]
    Request(String),

    #[error("can't read CA file {path}: {reason}")]
    CaFile { path: String, reason: String },

    #[error("unable to load client cert {cert} / key {key}: {reason}")]
    ClientCert {
        cert: String,
        key: String,
        reason: String,
    },

    #[error("tls setup: {0}")]
    Tls(#[from] rustls::Error),
}

pub type Result<T> = std::result::Result<T, ProbeError>;
