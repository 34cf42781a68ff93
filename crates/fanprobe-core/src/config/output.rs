//! Where response bodies go.

use crate::error::{ProbeError, Result};
use std::net::IpAddr;
use std::path::PathBuf;

/// Parsed output destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    Discard,
    /// File name pattern; the first `%` is replaced by the address.
    Files(String),
}

impl OutputTarget {
    pub fn from_pattern(pattern: &str) -> Result<Self> {
        match pattern {
            "" | "-" => Ok(OutputTarget::Stdout),
            "none" => Ok(OutputTarget::Discard),
            p if p.contains('%') => Ok(OutputTarget::Files(p.to_string())),
            p => Err(ProbeError::OutputPattern(p.to_string())),
        }
    }

    /// File for `addr` (plain address, no port or brackets). `None` unless `Files`.
    pub fn filename(&self, addr: IpAddr) -> Option<PathBuf> {
        match self {
            OutputTarget::Files(pattern) => {
                Some(PathBuf::from(pattern.replacen('%', &addr.to_string(), 1)))
            }
            OutputTarget::Stdout | OutputTarget::Discard => None,
        }
    }
}
