//! Integration tests: full runs against a local server, addresses pinned
//! through a static IP list so no DNS is involved.

mod common;

use chrono::{Datelike, TimeDelta, Utc};
use common::http_server::{self, ServerOptions};
use fanprobe_core::progress::NoProgress;
use fanprobe_core::retry::StopReason;
use fanprobe_core::{run, ProbeConfig, ProbeError, ProbeOutcome};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use tokio::time::Instant;

/// Config for `url` probing every address in `ips` (written to a temp file).
fn config_for(url: &str, ips: &[&str], dir: &TempDir) -> ProbeConfig {
    let list = dir.path().join("ips.txt");
    std::fs::write(&list, ips.join("\n")).unwrap();
    let mut cfg = ProbeConfig::new(url);
    cfg.ip_source = Some(list.display().to_string());
    cfg.output_pattern = "none".to_string();
    cfg.no_progress = true;
    cfg.repeat_delay = Duration::from_millis(10);
    cfg.request_timeout = Duration::from_secs(2);
    cfg
}

fn deadline_in(secs: u64) -> Instant {
    Instant::now() + Duration::from_secs(secs)
}

#[tokio::test]
async fn expected_code_mismatch_counts_one_error_per_address_per_pass() {
    let server = http_server::start(ServerOptions::default());
    let dir = tempdir().unwrap();
    let url = format!("http://probe.test:{}/", server.port);
    let mut cfg = config_for(&url, &["127.0.0.1", "127.0.0.1"], &dir);
    cfg.expected_code = 404;
    cfg.max_repeat = 1;

    let report = run(&cfg, deadline_in(20), Arc::new(NoProgress)).await.unwrap();
    assert_eq!(report.stop, StopReason::Exhausted);
    assert_eq!(report.stats.iterations, 2);
    assert_eq!(report.stats.errors, 4);
    assert_eq!(report.stats.warnings, 0);
    assert_eq!(report.errors, 2);
    assert_eq!(report.cert_expiry_ok, Some(true));
    assert_eq!(report.stats.addresses, vec!["127.0.0.1", "127.0.0.1"]);
    let key = format!("127.0.0.1:{}", server.port);
    assert_eq!(report.stats.code(&key), Some(200));
    assert_eq!(report.stats.size(&key), Some(5));
    assert_eq!(server.requests().len(), 4);
}

#[tokio::test]
async fn unexpected_status_without_expected_code_is_only_a_warning() {
    let server = http_server::start(ServerOptions {
        statuses: vec![503],
        ..Default::default()
    });
    let dir = tempdir().unwrap();
    let url = format!("http://probe.test:{}/", server.port);
    let cfg = config_for(&url, &["127.0.0.1", "127.0.0.1"], &dir);

    let report = run(&cfg, deadline_in(20), Arc::new(NoProgress)).await.unwrap();
    assert_eq!(report.stop, StopReason::Success);
    assert_eq!(report.errors, 0);
    assert!(report.is_success());
    assert_eq!(report.stats.errors, 0);
    assert_eq!(report.stats.warnings, 2);
    assert_eq!(report.stats.iterations, 1);
}

#[tokio::test]
async fn no_repeat_against_dead_port_is_one_pass_with_an_error_per_address() {
    let port = http_server::closed_port();
    let dir = tempdir().unwrap();
    let url = format!("http://probe.test:{}/", port);
    let cfg = config_for(&url, &["127.0.0.1", "127.0.0.1", "127.0.0.1"], &dir);

    let report = run(&cfg, deadline_in(20), Arc::new(NoProgress)).await.unwrap();
    assert_eq!(report.stats.iterations, 1);
    assert_eq!(report.errors, 3);
    assert_eq!(report.stop, StopReason::Exhausted);
    let key = format!("127.0.0.1:{}", port);
    assert!(matches!(
        report.stats.outcomes.get(&key),
        Some(ProbeOutcome::TransportError { .. })
    ));
}

#[tokio::test]
async fn repeats_until_a_clean_pass() {
    let server = http_server::start(ServerOptions {
        statuses: vec![500, 500, 200],
        ..Default::default()
    });
    let dir = tempdir().unwrap();
    let url = format!("http://probe.test:{}/", server.port);
    let mut cfg = config_for(&url, &["127.0.0.1"], &dir);
    cfg.expected_code = 200;
    cfg.max_repeat = -1;

    let report = run(&cfg, deadline_in(20), Arc::new(NoProgress)).await.unwrap();
    assert_eq!(report.stop, StopReason::Success);
    assert_eq!(report.stats.iterations, 3);
    assert_eq!(report.stats.errors, 2);
    assert_eq!(report.errors, 0);
}

#[tokio::test]
async fn deadline_during_sleep_aborts_without_cert_check() {
    let port = http_server::closed_port();
    let dir = tempdir().unwrap();
    let url = format!("http://probe.test:{}/", port);
    let mut cfg = config_for(&url, &["127.0.0.1"], &dir);
    cfg.max_repeat = -1;
    cfg.repeat_delay = Duration::from_secs(30);

    let started = std::time::Instant::now();
    let deadline = Instant::now() + Duration::from_millis(300);
    let report = run(&cfg, deadline, Arc::new(NoProgress)).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(report.stop, StopReason::DeadlineExceeded);
    assert_eq!(report.cert_expiry_ok, None);
    assert_eq!(report.stats.iterations, 1);
    assert_eq!(report.errors, 1);
}

#[tokio::test]
async fn per_address_files_with_headers() {
    let server = http_server::start(ServerOptions {
        extra_headers: vec![("X-Probe".to_string(), "1".to_string())],
        ..Default::default()
    });
    let dir = tempdir().unwrap();
    let url = format!("http://probe.test:{}/status?full=1", server.port);
    let mut cfg = config_for(&url, &["127.0.0.1"], &dir);
    cfg.output_pattern = format!("{}/out-%.txt", dir.path().display());
    cfg.include_headers = true;

    let report = run(&cfg, deadline_in(20), Arc::new(NoProgress)).await.unwrap();
    assert!(report.is_success());
    let written = std::fs::read_to_string(dir.path().join("out-127.0.0.1.txt")).unwrap();
    assert!(written.starts_with("HTTP/1.1 200 OK\n"), "{}", written);
    assert!(written.contains("\nContent-Length: 5\n"), "{}", written);
    assert!(written.contains("\nX-Probe: 1\n"), "{}", written);
    assert!(written.ends_with("\n\nhello"), "{}", written);

    let req = &server.requests()[0];
    assert_eq!(req.request_line(), "GET /status?full=1 HTTP/1.1");
    assert_eq!(
        req.header("host"),
        Some(format!("probe.test:{}", server.port))
    );
    assert_eq!(req.header("connection").as_deref(), Some("close"));
    assert!(req.header("user-agent").unwrap().starts_with("fanprobe/"));
}

#[tokio::test]
async fn payload_is_resent_with_content_length_on_every_probe() {
    let server = http_server::start(ServerOptions::default());
    let dir = tempdir().unwrap();
    let url = format!("http://probe.test:{}/submit", server.port);
    let mut cfg = config_for(&url, &["127.0.0.1", "127.0.0.1"], &dir);
    cfg.payload = Some(b"a=1&b=2".to_vec());
    cfg.add_header("Host: vhost.example").unwrap();
    cfg.add_header("User-Agent:").unwrap();

    let report = run(&cfg, deadline_in(20), Arc::new(NoProgress)).await.unwrap();
    assert!(report.is_success());
    let reqs = server.requests();
    assert_eq!(reqs.len(), 2);
    for req in reqs {
        assert_eq!(req.request_line(), "POST /submit HTTP/1.1");
        assert_eq!(req.header("content-length").as_deref(), Some("7"));
        assert!(req.header("transfer-encoding").is_none());
        assert_eq!(req.header("host").as_deref(), Some("vhost.example"));
        assert!(req.header("user-agent").is_none());
        assert_eq!(req.body, b"a=1&b=2");
    }
}

#[tokio::test]
async fn output_file_failure_counts_one_error_and_skips_request() {
    let server = http_server::start(ServerOptions::default());
    let dir = tempdir().unwrap();
    let url = format!("http://probe.test:{}/", server.port);
    let mut cfg = config_for(&url, &["127.0.0.1", "127.0.0.1"], &dir);
    cfg.output_pattern = "/nonexistent/fanprobe/out-%".to_string();

    let report = run(&cfg, deadline_in(20), Arc::new(NoProgress)).await.unwrap();
    assert_eq!(report.errors, 2);
    assert!(report.stats.outcomes.is_empty());
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn bad_ip_list_is_fatal() {
    let dir = tempdir().unwrap();
    let mut cfg = config_for("http://probe.test/", &["127.0.0.1", "bogus"], &dir);
    cfg.max_repeat = 3;
    let err = run(&cfg, deadline_in(20), Arc::new(NoProgress))
        .await
        .unwrap_err();
    assert!(matches!(err, ProbeError::IpList { .. }));
}

#[tokio::test]
async fn unbounded_request_timeout_is_capped_by_the_deadline() {
    let server = http_server::start(ServerOptions::default());
    let dir = tempdir().unwrap();
    let url = format!("http://probe.test:{}/", server.port);
    let mut cfg = config_for(&url, &["127.0.0.1"], &dir);
    cfg.request_timeout = Duration::MAX;

    let report = run(&cfg, deadline_in(5), Arc::new(NoProgress)).await.unwrap();
    assert!(report.is_success());
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn relookup_resolves_again_before_the_next_pass() {
    let server = http_server::start(ServerOptions::default());
    let url = format!("http://127.0.0.1:{}/", server.port);
    let mut cfg = ProbeConfig::new(url);
    cfg.output_pattern = "none".to_string();
    cfg.no_progress = true;
    cfg.repeat_delay = Duration::from_millis(10);
    cfg.request_timeout = Duration::from_secs(2);
    cfg.expected_code = 404;
    cfg.max_repeat = 1;
    cfg.relookup = true;

    let report = run(&cfg, deadline_in(20), Arc::new(NoProgress)).await.unwrap();
    assert_eq!(report.stop, StopReason::Exhausted);
    assert_eq!(report.stats.iterations, 2);
    assert_eq!(report.stats.errors, 2);
    assert_eq!(report.errors, 1);
    assert_eq!(report.stats.addresses, vec!["127.0.0.1"]);
    assert_eq!(server.requests().len(), 2);
}

#[tokio::test]
async fn truncated_body_is_an_error_but_keeps_bytes_read() {
    let server = http_server::start(ServerOptions {
        content_length: Some(10),
        ..Default::default()
    });
    let dir = tempdir().unwrap();
    let url = format!("http://probe.test:{}/", server.port);
    let mut cfg = config_for(&url, &["127.0.0.1"], &dir);
    cfg.output_pattern = format!("{}/body-%", dir.path().display());

    let report = run(&cfg, deadline_in(20), Arc::new(NoProgress)).await.unwrap();
    assert_eq!(report.errors, 1);
    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.warnings, 0);
    let key = format!("127.0.0.1:{}", server.port);
    assert_eq!(
        report.stats.outcomes.get(&key),
        Some(&ProbeOutcome::Response { code: 200, size: 5 })
    );
    let written = std::fs::read(dir.path().join("body-127.0.0.1")).unwrap();
    assert_eq!(written, b"hello");
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn each_address_is_dialed_directly() {
    let server = http_server::start(ServerOptions::default());
    let dir = tempdir().unwrap();
    let url = format!("http://probe.test:{}/", server.port);
    let cfg = config_for(&url, &["127.0.0.2", "127.0.0.1"], &dir);

    let report = run(&cfg, deadline_in(20), Arc::new(NoProgress)).await.unwrap();
    assert!(report.is_success());
    let dialed: Vec<String> = server
        .requests()
        .iter()
        .map(|r| r.local_ip.to_string())
        .collect();
    assert_eq!(dialed, vec!["127.0.0.2", "127.0.0.1"]);
    assert_eq!(report.stats.outcomes.len(), 2);
}

/// Self-signed certificate for `probe.test` expiring at midnight `days` from now.
fn short_lived_cert(days: i64) -> (rustls::pki_types::CertificateDer<'static>, Vec<u8>, String) {
    let expiry = Utc::now() + TimeDelta::days(days);
    let mut params = rcgen::CertificateParams::new(vec!["probe.test".to_string()]).unwrap();
    params.not_after = rcgen::date_time_ymd(expiry.year(), expiry.month() as u8, expiry.day() as u8);
    let key = rcgen::KeyPair::generate().unwrap();
    let cert = params.self_signed(&key).unwrap();
    (cert.der().clone(), key.serialize_der(), cert.pem())
}

fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn short_certificate_fails_an_otherwise_clean_run() {
    let (der, key, _) = short_lived_cert(3);
    let server = http_server::start_tls(ServerOptions::default(), der, key);
    let dir = tempdir().unwrap();
    let url = format!("https://probe.test:{}/", server.port);
    let mut cfg = config_for(&url, &["127.0.0.1"], &dir);
    cfg.insecure = true;

    let report = run(&cfg, deadline_in(20), Arc::new(NoProgress)).await.unwrap();
    assert_eq!(report.stop, StopReason::Success);
    assert_eq!(report.stats.errors, 0);
    assert_eq!(report.cert_expiry_ok, Some(false));
    assert_eq!(report.errors, 1);
    let floor = report.stats.shortest_cert_expiry.unwrap();
    assert!(floor < Utc::now() + TimeDelta::days(4));
}

#[tokio::test]
async fn trusted_ca_file_verifies_and_long_certificate_passes() {
    let (der, key, pem) = short_lived_cert(60);
    let server = http_server::start_tls(ServerOptions::default(), der, key);
    let dir = tempdir().unwrap();
    let url = format!("https://probe.test:{}/", server.port);
    let mut cfg = config_for(&url, &["127.0.0.1"], &dir);
    cfg.ca_file = Some(write_file(dir.path(), "ca.pem", &pem));

    let report = run(&cfg, deadline_in(20), Arc::new(NoProgress)).await.unwrap();
    assert_eq!(report.errors, 0, "{:?}", report.stats.outcomes);
    assert_eq!(report.cert_expiry_ok, Some(true));
    assert!(report.stats.shortest_cert_expiry.is_some());
}

#[tokio::test]
async fn untrusted_certificate_is_a_transport_error() {
    let (der, key, _) = short_lived_cert(60);
    let server = http_server::start_tls(ServerOptions::default(), der, key);
    let dir = tempdir().unwrap();
    let (_, _, other_pem) = short_lived_cert(60);
    let url = format!("https://probe.test:{}/", server.port);
    let mut cfg = config_for(&url, &["127.0.0.1"], &dir);
    cfg.ca_file = Some(write_file(dir.path(), "other-ca.pem", &other_pem));

    let report = run(&cfg, deadline_in(20), Arc::new(NoProgress)).await.unwrap();
    assert_eq!(report.errors, 1);
    assert!(report.stats.shortest_cert_expiry.is_none());
    let key = format!("127.0.0.1:{}", server.port);
    assert!(matches!(
        report.stats.outcomes.get(&key),
        Some(ProbeOutcome::TransportError { .. })
    ));
}
