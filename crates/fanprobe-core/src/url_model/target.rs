//! Parsed probe target: URL plus the host and port every probe dials.

use crate::error::{ProbeError, Result};
use std::net::{IpAddr, SocketAddr};
use url::{Position, Url};

use super::add_scheme;

/// Scheme of the target URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

/// Components derived from the configured URL at run start.
#[derive(Debug, Clone)]
pub struct Target {
    url: Url,
    scheme: Scheme,
    host: String,
    port: String,
    port_num: u16,
}

impl Target {
    /// Adds a default scheme, parses the URL and works out host and port.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(ProbeError::EmptyUrl);
        }
        let with_scheme = add_scheme(raw);
        let url = Url::parse(&with_scheme).map_err(|e| ProbeError::BadUrl {
            url: with_scheme.clone(),
            reason: e.to_string(),
        })?;
        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => {
                return Err(ProbeError::BadUrl {
                    url: with_scheme.clone(),
                    reason: format!("unsupported scheme {:?}", other),
                })
            }
        };
        let host = match url.host() {
            Some(url::Host::Ipv6(v6)) => v6.to_string(),
            Some(h) => h.to_string(),
            None => {
                return Err(ProbeError::BadUrl {
                    url: with_scheme.clone(),
                    reason: "missing host".to_string(),
                })
            }
        };
        let port = match url.port() {
            Some(p) => p.to_string(),
            None => {
                tracing::debug!("no port specified, using {}", url.scheme());
                url.scheme().to_string()
            }
        };
        let port_num = url
            .port_or_known_default()
            .ok_or_else(|| ProbeError::Port(port.clone()))?;
        Ok(Self {
            url,
            scheme,
            host,
            port,
            port_num,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Host without IPv6 brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port as written in the URL, or the scheme name when absent.
    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn port_num(&self) -> u16 {
        self.port_num
    }

    /// `host[:port]` as it appears in the URL; the default Host header value.
    pub fn authority(&self) -> &str {
        &self.url[Position::BeforeHost..Position::AfterPort]
    }

    /// Origin-form request target (`/path?query`).
    pub fn path_and_query(&self) -> &str {
        &self.url[Position::BeforePath..Position::AfterQuery]
    }

    /// Socket address a probe of `ip` dials.
    pub fn socket_addr(&self, ip: IpAddr) -> SocketAddr {
        SocketAddr::new(ip, self.port_num)
    }
}

/// `ip:port` with brackets around IPv6 addresses.
pub fn ip_port_string(ip: IpAddr, port: u16) -> String {
    SocketAddr::new(ip, port).to_string()
}
