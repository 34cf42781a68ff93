//! One probe: a single HTTP request sent to one pinned address.
//!
//! The [`Dispatcher`] is built once per run (request template, TLS config,
//! output target) and reused read-only for every address of every pass. A
//! probe never raises; everything that goes wrong is counted in its
//! [`ProbeReport`], which the retry loop folds into the run stats.

mod certs;
mod classify;
mod dial;
mod error;
mod headers;
mod request;
mod sink;
mod transport;

pub use certs::{earliest_expiry, inspect, CertInfo};
pub use classify::{classify_status, Verdict};
pub use dial::PinnedDial;
pub use error::ProbeFailure;
pub use headers::{canonical_name, status_text, write_response_head};
pub use request::RequestTemplate;
pub use sink::Sink;
pub use transport::{client_config, Connection, Transport};

use crate::config::OutputTarget;
use crate::progress::ProgressReporter;
use crate::stats::{ProbeOutcome, ResultStats};
use crate::url_model::{ip_port_string, Target};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Incoming};
use hyper::client::conn::http1::SendRequest;
use hyper::Response;
use std::io::Write;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Result of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// `ip:port` the probe dialed.
    pub ip_port: String,
    pub errors: usize,
    pub warnings: usize,
    /// `None` when the probe stopped before the request (output file failure).
    pub outcome: Option<ProbeOutcome>,
    /// Earliest certificate expiry presented by this address.
    pub cert_expiry: Option<DateTime<Utc>>,
}

impl ProbeReport {
    fn new(ip_port: String) -> Self {
        Self {
            ip_port,
            errors: 0,
            warnings: 0,
            outcome: None,
            cert_expiry: None,
        }
    }

    /// Records outcome and expiry into the run stats; the counts are left to
    /// the caller, which sums them per pass.
    pub fn fold_into(&self, stats: &mut ResultStats) {
        if let Some(outcome) = &self.outcome {
            stats.record_outcome(self.ip_port.clone(), outcome.clone());
        }
        if let Some(expiry) = self.cert_expiry {
            stats.lower_cert_expiry(expiry);
        }
    }
}

/// Run-scoped probe machinery.
pub struct Dispatcher {
    pub target: Target,
    pub template: RequestTemplate,
    pub transport: Transport,
    pub output: OutputTarget,
    pub include_headers: bool,
    pub expected_code: u16,
    pub request_timeout: Duration,
    /// Total run deadline; no probe outlives it.
    pub deadline: Instant,
    /// Reference instant for the days-to-expiry log lines.
    pub run_start: DateTime<Utc>,
    pub progress: Arc<dyn ProgressReporter>,
}

struct Exchange {
    // Held until the body is drained.
    sender: SendRequest<Full<Bytes>>,
    response: Response<Incoming>,
    peer_certs: Vec<rustls::pki_types::CertificateDer<'static>>,
}

impl Dispatcher {
    /// Probes `ip`. `index` is 1-based and prefixes every log line.
    pub async fn probe(&self, index: usize, ip: IpAddr) -> ProbeReport {
        let ip_port = ip_port_string(ip, self.target.port_num());
        let mut report = ProbeReport::new(ip_port);
        tracing::debug!("{}: using {}", index, ip);
        if let Some(len) = self.template.payload_len() {
            tracing::debug!("{}: using payload of {} bytes", index, len);
        }

        let mut sink = match Sink::open(&self.output, ip) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("{}: {}", index, e);
                report.errors = 1;
                return report;
            }
        };
        if let Some(path) = sink.path() {
            tracing::info!("{}: writing to {}", index, path.display());
        }

        let limit = Instant::now()
            .checked_add(self.request_timeout)
            .map_or(self.deadline, |t| t.min(self.deadline));
        let exchange = match self.exchange(index, ip, limit).await {
            Ok(x) => x,
            Err(e) => {
                tracing::error!("{}: error fetching {}: {}", index, ip, e);
                report.errors = 1;
                report.outcome = Some(ProbeOutcome::TransportError {
                    reason: e.to_string(),
                });
                return report;
            }
        };
        let Exchange {
            sender,
            response,
            peer_certs,
        } = exchange;
        let (head, body) = response.into_parts();
        let code = head.status.as_u16();
        let status = status_text(&head);
        match classify_status(code, self.expected_code) {
            Verdict::Ok => tracing::info!("{}: status {:?} from {}", index, status, ip),
            Verdict::Warning => {
                tracing::warn!("{}: status {:?} from {}", index, status, ip);
                report.warnings += 1;
            }
            Verdict::Error => {
                tracing::error!("{}: status {:?} (expected {}) from {}", index, status, self.expected_code, ip);
                report.errors += 1;
            }
        }
        report.cert_expiry = earliest_expiry(index, &peer_certs, self.run_start);

        let mut write_failed = false;
        if self.include_headers {
            if let Err(e) = write_response_head(&mut sink, &head) {
                tracing::error!("{}: {}", index, ProbeFailure::Write(e));
                report.errors += 1;
                write_failed = true;
            }
        }
        let (size, failure) = if write_failed {
            (0, None)
        } else {
            self.copy_body(index, body, &mut sink, limit).await
        };
        drop(sender);
        if let Some(e) = failure {
            tracing::error!("{}: error reading body from {}: {}", index, ip, e);
            report.errors += 1;
            write_failed = matches!(e, ProbeFailure::Write(_));
        }
        if let Err(e) = sink.flush() {
            if !write_failed {
                tracing::error!("{}: {}", index, ProbeFailure::Write(e));
                report.errors += 1;
            }
        }
        tracing::debug!("{}: read {} bytes from {}", index, size, ip);
        report.outcome = Some(ProbeOutcome::Response { code, size });
        report
    }

    /// Dial, handshake and send; bounded by `limit`.
    async fn exchange(&self, index: usize, ip: IpAddr, limit: Instant) -> Result<Exchange, ProbeFailure> {
        if Instant::now() >= self.deadline {
            return Err(ProbeFailure::DeadlineExceeded);
        }
        let dial = PinnedDial::new(index, self.target.socket_addr(ip));
        let request = self.template.build();
        tracing::trace!(
            "{}: {} {} via {} ({} headers)",
            index,
            self.template.method(),
            request.uri(),
            dial.addr(),
            self.template.headers().len()
        );
        let attempt = async {
            let Connection {
                mut sender,
                peer_certs,
            } = self.transport.connect(&dial, limit).await?;
            let response = sender.send_request(request).await.map_err(ProbeFailure::Http)?;
            Ok::<_, ProbeFailure>(Exchange {
                sender,
                response,
                peer_certs,
            })
        };
        match tokio::time::timeout_at(limit, attempt).await {
            Ok(result) => result,
            Err(_) => Err(self.timed_out()),
        }
    }

    /// Streams the body into `sink`. Returns the bytes read and the failure
    /// that stopped the copy, if any.
    async fn copy_body(
        &self,
        index: usize,
        mut body: Incoming,
        sink: &mut Sink,
        limit: Instant,
    ) -> (u64, Option<ProbeFailure>) {
        let progress = self.progress.begin(index, body.size_hint().exact());
        let mut size = 0u64;
        let failure = loop {
            let next = match tokio::time::timeout_at(limit, body.frame()).await {
                Ok(next) => next,
                Err(_) => break Some(self.timed_out()),
            };
            match next {
                None => break None,
                Some(Err(e)) => break Some(ProbeFailure::Body(e)),
                Some(Ok(frame)) => {
                    let Ok(data) = frame.into_data() else {
                        continue;
                    };
                    size += data.len() as u64;
                    progress.advance(data.len() as u64);
                    if let Err(e) = sink.write_all(&data) {
                        break Some(ProbeFailure::Write(e));
                    }
                }
            }
        };
        progress.finish();
        (size, failure)
    }

    fn timed_out(&self) -> ProbeFailure {
        if Instant::now() >= self.deadline {
            ProbeFailure::DeadlineExceeded
        } else {
            ProbeFailure::Timeout(self.request_timeout)
        }
    }
}
