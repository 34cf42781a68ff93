//! Address resolution: turn the target host into the list of addresses to probe.
//!
//! Either a DNS lookup filtered by family (optionally capped to the first N
//! results) or a static list read from a file or stdin.

mod dns;
mod ip_list;

pub use dns::{literal_ip, lookup};
pub use ip_list::{parse_ips, read_ips};

use crate::config::{ProbeConfig, ResolveType};
use crate::error::{ProbeError, Result};
use crate::url_model::Target;
use std::net::IpAddr;

/// Addresses to probe for this run.
///
/// The static list, when configured, is used as is: no family filter and no cap.
pub async fn resolve(cfg: &ProbeConfig, target: &Target) -> Result<Vec<IpAddr>> {
    if let Some(source) = cfg.ip_source.as_deref() {
        let addrs = read_ips(source)?;
        tracing::info!(
            "resolved {} {}:{} to port {} and {} {} {:?} - from {}",
            cfg.resolve_type,
            target.host(),
            target.port(),
            target.port_num(),
            addrs.len(),
            plural_addresses(addrs.len()),
            addrs,
            source
        );
        if addrs.is_empty() {
            tracing::warn!("no addresses in {}", source);
        }
        return Ok(addrs);
    }
    tracing::debug!(
        "resolving {} host {} (port {} -> {})",
        cfg.resolve_type,
        target.host(),
        target.port(),
        target.port_num()
    );
    let found = resolve_all(target.host(), cfg.resolve_type).await?;
    let n = found.len();
    let addrs = cap_addresses(found.clone(), cfg.max_ips);
    if addrs.len() < n {
        tracing::info!(
            "resolved {} {}:{} to port {} and {} {} {:?} - keeping first {}",
            cfg.resolve_type,
            target.host(),
            target.port(),
            target.port_num(),
            n,
            plural_addresses(n),
            found,
            cfg.max_ips
        );
    } else {
        tracing::info!(
            "resolved {} {}:{} to port {} and {} {} {:?}",
            cfg.resolve_type,
            target.host(),
            target.port(),
            target.port_num(),
            n,
            plural_addresses(n),
            addrs
        );
    }
    Ok(addrs)
}

/// Literal addresses short-circuit (whatever the family); names go to DNS.
pub async fn resolve_all(host: &str, family: ResolveType) -> Result<Vec<IpAddr>> {
    if let Some(ip) = literal_ip(host) {
        tracing::debug!("{} is already an ip", host);
        return Ok(vec![ip]);
    }
    let addrs = lookup(host, family).await.map_err(|reason| {
        tracing::error!("unable to lookup {:?}: {}", host, reason);
        ProbeError::Resolve {
            family: family.to_string(),
            host: host.to_string(),
            reason,
        }
    })?;
    if addrs.is_empty() {
        return Err(ProbeError::Resolve {
            family: family.to_string(),
            host: host.to_string(),
            reason: "no addresses found".to_string(),
        });
    }
    Ok(addrs)
}

/// Keeps the first `max` addresses; 0 means no cap.
pub fn cap_addresses(mut addrs: Vec<IpAddr>, max: usize) -> Vec<IpAddr> {
    if max > 0 && addrs.len() > max {
        addrs.truncate(max);
    }
    addrs
}

fn plural_addresses(n: usize) -> &'static str {
    if n == 1 {
        "address"
    } else {
        "addresses"
    }
}
