//! CLI for fanprobe.

mod duration;
mod payload;
mod progress;

use anyhow::Result;
use clap::{ArgAction, Parser};
use fanprobe_core::config::{self, FileDefaults, ProbeConfig, ResolveType};
use fanprobe_core::expiry;
use fanprobe_core::progress::ProgressReporter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use duration::{from_secs_lossy, parse_duration};
use payload::load_payload;
use progress::BarReporter;

/// Send the same HTTP request to every address a host name resolves to.
#[derive(Debug, Parser)]
#[command(name = "fanprobe", version)]
#[command(
    about = "Send the same HTTP request to every IP address of a host",
    long_about = None
)]
pub struct Cli {
    /// URL to fetch; http:// is assumed when no scheme is given.
    pub url: String,

    /// Only use IPv4 addresses.
    #[arg(short = '4')]
    pub ipv4: bool,

    /// Only use IPv6 addresses.
    #[arg(short = '6')]
    pub ipv6: bool,

    /// Write the status line and response headers before the body.
    #[arg(short = 'i', long = "include")]
    pub include_headers: bool,

    /// HTTP method (default GET, or POST with -d).
    #[arg(short = 'X', long = "request", value_name = "METHOD")]
    pub method: Option<String>,

    /// Timeout for the whole run, repeats included.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub total_timeout: Option<Duration>,

    /// Timeout for each request.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub request_timeout: Option<Duration>,

    /// Extra header, repeatable. `Host:` changes the Host header and TLS
    /// server name, an empty `User-Agent:` removes that header.
    #[arg(short = 'H', long = "header", value_name = "KEY:VALUE")]
    pub headers: Vec<String>,

    /// Output: empty or `-` for stdout, `none` to discard, or a file name
    /// pattern where `%` is replaced by the address.
    #[arg(short = 'o', long = "output", value_name = "PATTERN", default_value = "")]
    pub output: String,

    /// Request payload; `@file` reads a file, `@-` reads stdin.
    #[arg(short = 'd', long = "data", value_name = "DATA")]
    pub data: Option<String>,

    /// Read the addresses from FILE (`-` for stdin) instead of DNS.
    #[arg(short = 'I', long = "ip-file", value_name = "FILE")]
    pub ip_file: Option<String>,

    /// Expected status code; anything else is an error. 0 accepts 200 and
    /// warns on other codes.
    #[arg(long, value_name = "CODE", default_value_t = 0)]
    pub expected: u16,

    /// Repeat passes while there are errors: 0 never, N at most N times,
    /// negative until success or the total timeout.
    #[arg(long, value_name = "N", default_value_t = 0, allow_negative_numbers = true)]
    pub repeat: i32,

    /// Delay between repeated passes.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub repeat_delay: Option<Duration>,

    /// Use at most N addresses (0 for all).
    #[arg(short = 'n', long = "max-ips", value_name = "N", default_value_t = 0)]
    pub max_ips: usize,

    /// Resolve the host again before each repeated pass.
    #[arg(long)]
    pub relookup: bool,

    /// Fail when a server certificate expires within DAYS.
    #[arg(long = "cert-expiry", value_name = "DAYS")]
    pub cert_expiry_days: Option<f64>,

    /// PEM file with the CA certificates to trust instead of the system roots.
    #[arg(long, value_name = "FILE")]
    pub cacert: Option<PathBuf>,

    /// Skip server certificate verification.
    #[arg(short = 'k', long)]
    pub insecure: bool,

    /// Client certificate (PEM).
    #[arg(long, value_name = "FILE", requires = "key")]
    pub cert: Option<PathBuf>,

    /// Client private key (PEM).
    #[arg(long, value_name = "FILE", requires = "cert")]
    pub key: Option<PathBuf>,

    /// Print the collected results as JSON on stdout when done.
    #[arg(long)]
    pub json: bool,

    /// No progress bar.
    #[arg(long)]
    pub nobar: bool,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Append logs to FILE instead of stderr.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Defaults file (default: ~/.config/fanprobe/config.toml).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Tracing filter directive for `-v` / `-q`.
    pub fn log_directive(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// File defaults from `--config`, else the XDG config file if present.
    pub fn load_defaults(&self) -> Result<FileDefaults> {
        match &self.config {
            Some(path) => config::load_defaults_from(path),
            None => config::load_defaults(),
        }
    }

    pub fn total_timeout(&self, defaults: &FileDefaults) -> Duration {
        self.total_timeout
            .unwrap_or_else(|| from_secs_lossy(defaults.total_timeout_secs))
    }

    /// Flags over file defaults.
    pub fn to_config(&self, defaults: &FileDefaults) -> Result<ProbeConfig> {
        let mut cfg = ProbeConfig::new(self.url.clone());
        cfg.resolve_type = ResolveType::from_flags(self.ipv4, self.ipv6);
        cfg.method = self.method.clone();
        cfg.request_timeout = self
            .request_timeout
            .unwrap_or_else(|| from_secs_lossy(defaults.request_timeout_secs));
        cfg.include_headers = self.include_headers;
        for header in &self.headers {
            cfg.add_header(header)?;
        }
        cfg.output_pattern = self.output.clone();
        cfg.payload = self
            .data
            .as_deref()
            .filter(|data| !data.is_empty())
            .map(load_payload)
            .transpose()?;
        cfg.ip_source = self.ip_file.clone();
        cfg.expected_code = self.expected;
        cfg.max_repeat = self.repeat;
        cfg.repeat_delay = self
            .repeat_delay
            .unwrap_or_else(|| from_secs_lossy(defaults.repeat_delay_secs));
        cfg.max_ips = self.max_ips;
        cfg.relookup = self.relookup;
        cfg.cert_expiry_error =
            expiry::dur_days(self.cert_expiry_days.unwrap_or(defaults.cert_expiry_days));
        cfg.ca_file = self.cacert.clone();
        cfg.insecure = self.insecure;
        cfg.client_cert = self.cert.clone();
        cfg.client_key = self.key.clone();
        cfg.no_progress = self.nobar;
        Ok(cfg)
    }

    /// Runs the probe and returns the process exit code.
    ///
    /// Errors are setup failures (bad flags, config file, URL, first
    /// resolution); the caller exits 1 for those.
    pub async fn run(self) -> Result<i32> {
        let defaults = self.load_defaults()?;
        tracing::debug!("defaults: {:?}", defaults);
        let cfg = self.to_config(&defaults)?;
        let deadline = deadline_after(self.total_timeout(&defaults));
        let progress: Arc<dyn ProgressReporter> = Arc::new(BarReporter);

        let report = fanprobe_core::run(&cfg, deadline, progress).await?;

        tracing::info!(
            "total iterations: {}, errors: {}, warnings: {}",
            report.stats.iterations,
            report.stats.errors,
            report.stats.warnings
        );
        if self.json {
            println!("{}", serde_json::to_string_pretty(&report.stats)?);
        }
        Ok(exit_code(report.errors))
    }
}

/// Run deadline `total` from now; an unrepresentable instant becomes ~30 years.
pub fn deadline_after(total: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(total)
        .unwrap_or_else(|| now + Duration::from_secs(86400 * 365 * 30))
}

/// Error count as a process exit code.
pub fn exit_code(errors: usize) -> i32 {
    errors.min(255) as i32
}

#[cfg(test)]
mod tests;
