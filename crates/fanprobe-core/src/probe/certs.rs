//! Peer certificate inspection.

use chrono::{DateTime, Utc};
use rustls::pki_types::CertificateDer;
use x509_parser::prelude::*;

#[derive(Debug, Clone)]
pub struct CertInfo {
    pub subject: String,
    pub not_after: DateTime<Utc>,
}

/// Subject and `notAfter` of a DER certificate; `None` if it doesn't parse.
pub fn inspect(der: &CertificateDer<'_>) -> Option<CertInfo> {
    let (_, cert) = parse_x509_certificate(der.as_ref()).ok()?;
    let not_after = DateTime::<Utc>::from_timestamp(cert.validity().not_after.timestamp(), 0)?;
    Some(CertInfo {
        subject: cert.subject().to_string(),
        not_after,
    })
}

/// Earliest `notAfter` in `chain`, logging every certificate on the way.
pub fn earliest_expiry(
    index: usize,
    chain: &[CertificateDer<'static>],
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let mut earliest: Option<DateTime<Utc>> = None;
    for der in chain {
        let Some(info) = inspect(der) else {
            tracing::warn!("{}: unable to parse peer certificate", index);
            continue;
        };
        tracing::info!(
            "certificate {:?} expires in {:.0} days",
            info.subject,
            crate::expiry::days_between(now, info.not_after)
        );
        if earliest.map_or(true, |e| info.not_after < e) {
            earliest = Some(info.not_after);
        }
    }
    earliest
}
