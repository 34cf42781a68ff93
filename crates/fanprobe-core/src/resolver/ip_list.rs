//! Static address lists: one address per line, `#` comments, optional `[v6]` brackets.

use crate::error::{ProbeError, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::net::IpAddr;

/// Reads the list from `source`, a path or `-` for stdin.
pub fn read_ips(source: &str) -> Result<Vec<IpAddr>> {
    let to_err = |reason: String| ProbeError::IpList {
        source_name: source.to_string(),
        reason,
    };
    if source == "-" {
        tracing::info!("using stdin for list of ips to connect to");
        return parse_ips(io::stdin().lock()).map_err(to_err);
    }
    tracing::info!("using content of {:?} to resolve ips", source);
    let file = File::open(source).map_err(|e| to_err(e.to_string()))?;
    parse_ips(BufReader::new(file)).map_err(to_err)
}

/// Parses every line; the first bad line fails the whole list.
pub fn parse_ips<R: BufRead>(reader: R) -> std::result::Result<Vec<IpAddr>, String> {
    let mut addrs = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| e.to_string())?;
        let entry = line.trim();
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }
        let bare = entry
            .strip_prefix('[')
            .and_then(|e| e.strip_suffix(']'))
            .unwrap_or(entry);
        let ip: IpAddr = bare
            .parse()
            .map_err(|_| format!("line {}: unable to parse ip {:?}", lineno + 1, bare))?;
        addrs.push(ip);
    }
    Ok(addrs)
}
