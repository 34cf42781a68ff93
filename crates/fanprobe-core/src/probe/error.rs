//! Per-probe failure type.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Why a single probe (or part of it) failed. Each one is counted as one error
/// for the address; none of them stop the run.
#[derive(Debug)]
pub enum ProbeFailure {
    /// The per-address output file could not be created.
    OutputFile { path: PathBuf, source: io::Error },
    /// TCP connect to the pinned address failed.
    Connect(io::Error),
    /// TLS handshake failed (including certificate verification).
    Tls(io::Error),
    /// HTTP/1 handshake or round trip failed.
    Http(hyper::Error),
    /// Per-request timeout elapsed.
    Timeout(Duration),
    /// The total run deadline passed while the probe was in flight.
    DeadlineExceeded,
    /// Reading the response body failed after the status arrived.
    Body(hyper::Error),
    /// Writing to the output sink failed.
    Write(io::Error),
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::OutputFile { path, source } => {
                write!(f, "error creating file {}: {}", path.display(), source)
            }
            ProbeFailure::Connect(e) => write!(f, "connect: {}", e),
            ProbeFailure::Tls(e) => write!(f, "tls: {}", e),
            ProbeFailure::Http(e) => write!(f, "http: {}", e),
            ProbeFailure::Timeout(d) => write!(f, "request timeout after {:?}", d),
            ProbeFailure::DeadlineExceeded => write!(f, "total timeout reached"),
            ProbeFailure::Body(e) => write!(f, "reading body: {}", e),
            ProbeFailure::Write(e) => write!(f, "writing output: {}", e),
        }
    }
}

impl std::error::Error for ProbeFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProbeFailure::OutputFile { source, .. } => Some(source),
            ProbeFailure::Connect(e) | ProbeFailure::Tls(e) | ProbeFailure::Write(e) => Some(e),
            ProbeFailure::Http(e) | ProbeFailure::Body(e) => Some(e),
            ProbeFailure::Timeout(_) | ProbeFailure::DeadlineExceeded => None,
        }
    }
}
