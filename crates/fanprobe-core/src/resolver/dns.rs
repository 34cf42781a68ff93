//! DNS lookups through hickory with the system resolver configuration.

use crate::config::ResolveType;
use hickory_resolver::config::LookupIpStrategy;
use hickory_resolver::TokioAsyncResolver;
use std::net::IpAddr;

/// Parses `host` as an address, accepting `[v6]` brackets.
pub fn literal_ip(host: &str) -> Option<IpAddr> {
    let bare = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    bare.parse().ok()
}

/// Looks up `host` keeping only the requested family, in resolver order.
pub async fn lookup(host: &str, family: ResolveType) -> Result<Vec<IpAddr>, String> {
    let (config, mut opts) =
        hickory_resolver::system_conf::read_system_conf().map_err(|e| e.to_string())?;
    opts.ip_strategy = match family {
        ResolveType::Ip4 => LookupIpStrategy::Ipv4Only,
        ResolveType::Ip6 => LookupIpStrategy::Ipv6Only,
        ResolveType::Ip => LookupIpStrategy::Ipv4AndIpv6,
    };
    let resolver = TokioAsyncResolver::tokio(config, opts);
    let answer = resolver.lookup_ip(host).await.map_err(|e| e.to_string())?;
    Ok(answer.iter().collect())
}
