//! Run result accumulator.
//!
//! Owned by the retry loop and passed down by `&mut`; never shared.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::IpAddr;

/// Last observed result for one `ip:port`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// A response arrived; `size` is the number of body bytes read (even if
    /// the body read later failed).
    Response { code: u16, size: u64 },
    /// No response: dial, TLS, round trip or timeout failure.
    TransportError { reason: String },
}

/// Summary of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultStats {
    /// Errors summed over every pass.
    pub errors: usize,
    /// Warnings (unexpected but tolerated status codes) summed over every pass.
    pub warnings: usize,
    /// Addresses of the first pass, in probe order.
    pub addresses: Vec<String>,
    /// Outcome per `ip:port` from the most recent pass.
    pub outcomes: BTreeMap<String, ProbeOutcome>,
    /// Completed passes, including the last one.
    pub iterations: u32,
    /// Earliest certificate `notAfter` seen on any address in any pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortest_cert_expiry: Option<DateTime<Utc>>,
}

impl ResultStats {
    /// Records the address list; only the first call has an effect.
    pub fn capture_addresses(&mut self, addrs: &[IpAddr]) {
        if self.addresses.is_empty() && self.iterations <= 1 {
            self.addresses = addrs.iter().map(|a| a.to_string()).collect();
        }
    }

    pub fn record_outcome(&mut self, ip_port: impl Into<String>, outcome: ProbeOutcome) {
        self.outcomes.insert(ip_port.into(), outcome);
    }

    /// Lowers the expiry floor to `not_after` if it is earlier. Returns true when it moved.
    pub fn lower_cert_expiry(&mut self, not_after: DateTime<Utc>) -> bool {
        match self.shortest_cert_expiry {
            Some(current) if current <= not_after => false,
            _ => {
                self.shortest_cert_expiry = Some(not_after);
                true
            }
        }
    }

    /// Status code last seen for `ip_port`, if a response arrived.
    pub fn code(&self, ip_port: &str) -> Option<u16> {
        match self.outcomes.get(ip_port)? {
            ProbeOutcome::Response { code, .. } => Some(*code),
            ProbeOutcome::TransportError { .. } => None,
        }
    }

    /// Body size last seen for `ip_port`, if a response arrived.
    pub fn size(&self, ip_port: &str) -> Option<u64> {
        match self.outcomes.get(ip_port)? {
            ProbeOutcome::Response { size, .. } => Some(*size),
            ProbeOutcome::TransportError { .. } => None,
        }
    }
}
