//! Run entry point: validate, resolve, build the dispatcher, loop, check certs.

use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};
use crate::expiry;
use crate::probe::{Dispatcher, RequestTemplate, Transport};
use crate::progress::{NoProgress, ProgressReporter};
use crate::resolver;
use crate::retry::{run_passes, RepeatPolicy, StopReason};
use crate::stats::ResultStats;
use crate::url_model::Target;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Instant;

/// Outcome of a run that got past setup.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Errors of the last pass, plus one when the certificate check failed.
    /// 0 means success.
    pub errors: usize,
    pub stop: StopReason,
    /// `None` when the loop was aborted and the check never ran.
    pub cert_expiry_ok: Option<bool>,
    pub stats: ResultStats,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }
}

/// Probes every address of `cfg.url` until success, exhaustion or `deadline`.
///
/// Fatal setup problems (bad config, url, first resolution, request or TLS
/// setup) are returned as errors; everything after that is counted in the
/// report.
pub async fn run(
    cfg: &ProbeConfig,
    deadline: Instant,
    progress: Arc<dyn ProgressReporter>,
) -> Result<RunReport> {
    let run_start = Utc::now();
    tracing::info!(
        "fanprobe {}, using resolver {}, {} {}",
        env!("CARGO_PKG_VERSION"),
        cfg.resolve_type,
        cfg.effective_method(),
        cfg.url
    );
    let output = cfg.validate()?;
    let target = Target::parse(&cfg.url)?;
    let addrs = match tokio::time::timeout_at(deadline, resolver::resolve(cfg, &target)).await {
        Ok(found) => found?,
        Err(_) => {
            return Err(ProbeError::Resolve {
                family: cfg.resolve_type.to_string(),
                host: target.host().to_string(),
                reason: "total timeout reached".to_string(),
            })
        }
    };
    let template = RequestTemplate::new(cfg, &target)?;
    let transport = Transport::new(cfg, &target)?;
    let progress: Arc<dyn ProgressReporter> = if cfg.no_progress {
        Arc::new(NoProgress)
    } else {
        progress
    };
    let dispatcher = Dispatcher {
        target,
        template,
        transport,
        output,
        include_headers: cfg.include_headers,
        expected_code: cfg.expected_code,
        request_timeout: cfg.request_timeout,
        deadline,
        run_start,
        progress,
    };

    let mut stats = ResultStats::default();
    let policy = RepeatPolicy::new(cfg.max_repeat, cfg.repeat_delay);
    let outcome = run_passes(&dispatcher, &policy, cfg, addrs, &mut stats).await;

    let mut errors = outcome.errors;
    let cert_expiry_ok = if outcome.stop.runs_cert_check() {
        let good = expiry::check_cert_expiry(&stats, run_start, cfg.cert_expiry_error);
        if !good {
            errors += 1;
        }
        Some(good)
    } else {
        None
    };
    Ok(RunReport {
        errors,
        stop: outcome.stop,
        cert_expiry_ok,
        stats,
    })
}
