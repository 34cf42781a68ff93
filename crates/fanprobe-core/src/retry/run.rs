//! The pass loop: probe every address, evaluate, sleep or stop.

use crate::config::ProbeConfig;
use crate::probe::Dispatcher;
use crate::resolver;
use crate::retry::policy::{RepeatDecision, RepeatPolicy};
use crate::stats::ResultStats;
use serde::Serialize;
use std::net::IpAddr;
use tokio::time::{sleep, sleep_until, timeout_at};

/// Why the pass loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Last pass had no errors.
    Success,
    /// Repeat budget spent with errors remaining.
    Exhausted,
    /// Total deadline hit while waiting between passes.
    DeadlineExceeded,
    /// Resolving again between passes failed.
    ReResolveFailed,
}

impl StopReason {
    /// Only a loop that ran to its normal end gets the certificate check.
    pub fn runs_cert_check(self) -> bool {
        matches!(self, StopReason::Success | StopReason::Exhausted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopResult {
    /// Errors of the last completed pass (1 on re-resolve failure).
    pub errors: usize,
    pub stop: StopReason,
}

/// Runs passes over `addrs` until the policy, the deadline, or a failed
/// re-resolution stops it. `stats` is the only state mutated.
pub async fn run_passes(
    dispatcher: &Dispatcher,
    policy: &RepeatPolicy,
    cfg: &ProbeConfig,
    mut addrs: Vec<IpAddr>,
    stats: &mut ResultStats,
) -> LoopResult {
    stats.iterations = 1;
    loop {
        let (errors, warnings) = run_pass(dispatcher, &addrs, stats).await;
        stats.errors += errors;
        stats.warnings += warnings;
        log_pass_summary(stats, errors, warnings);

        match policy.decide(stats.iterations, errors) {
            RepeatDecision::Done => {
                return LoopResult {
                    errors,
                    stop: StopReason::Success,
                }
            }
            RepeatDecision::Exhausted => {
                tracing::error!("reached max repeat {}", policy.max_repeat.unwrap_or_default());
                return LoopResult {
                    errors,
                    stop: StopReason::Exhausted,
                };
            }
            RepeatDecision::RetryAfter(delay) => {
                tracing::debug!("sleeping for {:?} before next iteration", delay);
                tokio::select! {
                    biased;
                    _ = sleep_until(dispatcher.deadline) => {
                        tracing::error!("interrupted/total timeout reached");
                        return LoopResult { errors, stop: StopReason::DeadlineExceeded };
                    }
                    _ = sleep(delay) => {}
                }
            }
        }

        if cfg.relookup && cfg.ip_source.is_none() {
            let target = &dispatcher.target;
            tracing::debug!("re-resolving {} host {}", cfg.resolve_type, target.host());
            match timeout_at(dispatcher.deadline, resolver::resolve(cfg, target)).await {
                Ok(Ok(found)) => addrs = found,
                Ok(Err(e)) => {
                    tracing::error!("unable to re-resolve: {}", e);
                    return LoopResult {
                        errors: 1,
                        stop: StopReason::ReResolveFailed,
                    };
                }
                Err(_) => {
                    tracing::error!("interrupted/total timeout reached while re-resolving");
                    return LoopResult {
                        errors,
                        stop: StopReason::DeadlineExceeded,
                    };
                }
            }
        }
        stats.iterations += 1;
    }
}

/// One probe per address, in order. Returns this pass's (errors, warnings).
async fn run_pass(dispatcher: &Dispatcher, addrs: &[IpAddr], stats: &mut ResultStats) -> (usize, usize) {
    let mut errors = 0;
    let mut warnings = 0;
    for (i, ip) in addrs.iter().enumerate() {
        // humans start counting at 1
        let report = dispatcher.probe(i + 1, *ip).await;
        errors += report.errors;
        warnings += report.warnings;
        report.fold_into(stats);
    }
    stats.capture_addresses(addrs);
    (errors, warnings)
}

/// Severity follows the run totals so far.
fn log_pass_summary(stats: &ResultStats, errors: usize, warnings: usize) {
    let line = format!(
        "[{}] {} {} ({} {})",
        stats.iterations,
        errors,
        plural(errors, "error"),
        warnings,
        plural(warnings, "warning")
    );
    if stats.errors > 0 {
        tracing::error!("{}", line);
    } else if stats.warnings > 0 {
        tracing::warn!("{}", line);
    } else {
        tracing::info!("{}", line);
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
