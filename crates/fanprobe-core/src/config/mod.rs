//! Run parameters for a probe sweep.
//!
//! [`ProbeConfig`] is built by the caller (usually the CLI), then validated once
//! by the engine before any network activity.

mod file;
mod headers;
mod output;

pub use file::{load_defaults, load_defaults_from, FileDefaults};
pub use headers::ExtraHeaders;
pub use output::OutputTarget;

use crate::error::{ProbeError, Result};
use crate::expiry;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Address family filter applied to DNS lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveType {
    Ip4,
    Ip6,
    /// Both families.
    #[default]
    Ip,
}

impl ResolveType {
    /// Family from the `-4` / `-6` flags; both or neither means both families.
    pub fn from_flags(ipv4: bool, ipv6: bool) -> Self {
        match (ipv4, ipv6) {
            (true, false) => ResolveType::Ip4,
            (false, true) => ResolveType::Ip6,
            _ => ResolveType::Ip,
        }
    }
}

impl fmt::Display for ResolveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResolveType::Ip4 => "ip4",
            ResolveType::Ip6 => "ip6",
            ResolveType::Ip => "ip",
        };
        f.write_str(s)
    }
}

/// Default delay between repeated passes.
pub const DEFAULT_REPEAT_DELAY: Duration = Duration::from_secs(5);
/// Default certificate expiry error threshold in days.
pub const DEFAULT_CERT_EXPIRY_DAYS: f64 = 7.0;
/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// User-Agent sent unless overridden with a `User-Agent:` extra header.
pub fn default_user_agent() -> String {
    format!("fanprobe/{}", env!("CARGO_PKG_VERSION"))
}

/// Everything needed to probe all addresses of one URL.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// URL to fetch; `http://` is assumed when the scheme is missing.
    pub url: String,
    pub resolve_type: ResolveType,
    /// HTTP method; `None` means GET, or POST when a payload is set.
    pub method: Option<String>,
    /// Timeout for a single request (connect through body read).
    pub request_timeout: Duration,
    /// Write the status line and response headers before the body.
    pub include_headers: bool,
    pub headers: ExtraHeaders,
    /// Host/authority sent instead of the URL host. Also used as TLS server name.
    pub host_override: Option<String>,
    /// `""` or `-` for stdout, `none` to discard, otherwise a pattern containing `%`.
    pub output_pattern: String,
    pub payload: Option<Vec<u8>>,
    /// File with the addresses to use instead of DNS (`-` for stdin).
    pub ip_source: Option<String>,
    /// 0 means "200 is ok, anything else is a warning"; otherwise any other code is an error.
    pub expected_code: u16,
    /// 0: no repeat. Negative: repeat until no errors or the deadline. Positive: at most that many repeats.
    pub max_repeat: i32,
    pub repeat_delay: Duration,
    /// 0 means use every address found.
    pub max_ips: usize,
    /// Resolve again between passes (ignored with `ip_source`).
    pub relookup: bool,
    /// Error out when a certificate expires sooner than this.
    pub cert_expiry_error: Duration,
    pub ca_file: Option<PathBuf>,
    pub insecure: bool,
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
    pub no_progress: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            resolve_type: ResolveType::Ip,
            method: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            include_headers: false,
            headers: ExtraHeaders::new(default_user_agent()),
            host_override: None,
            output_pattern: String::new(),
            payload: None,
            ip_source: None,
            expected_code: 0,
            max_repeat: 0,
            repeat_delay: DEFAULT_REPEAT_DELAY,
            max_ips: 0,
            relookup: false,
            cert_expiry_error: expiry::dur_days(DEFAULT_CERT_EXPIRY_DAYS),
            ca_file: None,
            insecure: false,
            client_cert: None,
            client_key: None,
            no_progress: false,
        }
    }
}

impl ProbeConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Checks the parameters that can be rejected without touching the network.
    /// Returns the parsed output target.
    pub fn validate(&self) -> Result<OutputTarget> {
        let output = OutputTarget::from_pattern(&self.output_pattern)?;
        if self.url.is_empty() {
            return Err(ProbeError::EmptyUrl);
        }
        Ok(output)
    }

    /// Method actually sent.
    pub fn effective_method(&self) -> &str {
        match self.method.as_deref() {
            Some(m) if !m.is_empty() => m,
            _ if self.payload.is_some() => "POST",
            _ => "GET",
        }
    }

    /// Adds a `Key: Value` extra header.
    ///
    /// `Host` goes to [`ProbeConfig::host_override`] (trimmed). `User-Agent`
    /// replaces the default: an empty value suppresses the header, while
    /// whitespace is kept as is and sent as an empty header. Anything else is
    /// appended, keeping earlier values for the same name.
    pub fn add_header(&mut self, hdr: &str) -> Result<()> {
        let (key, value) = hdr
            .split_once(':')
            .ok_or_else(|| ProbeError::Header(hdr.to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ProbeError::Header(hdr.to_string()));
        }
        match key.to_ascii_lowercase().as_str() {
            "host" => {
                tracing::debug!("will be setting special Host header to {}", value.trim());
                let host = value.trim();
                self.host_override = (!host.is_empty()).then(|| host.to_string());
            }
            "user-agent" => {
                tracing::debug!("User-Agent being set to {:?}", value);
                self.headers.set_user_agent(value);
            }
            _ => {
                tracing::debug!("setting regular extra header {}: {}", key, value);
                self.headers.append(key, value);
            }
        }
        Ok(())
    }
}
