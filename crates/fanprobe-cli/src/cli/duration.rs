//! Duration flag values: `500ms`, `3s`, `2m`, `1h`, or bare seconds (`1.5`).

use std::time::Duration;

pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let s = raw.trim();
    let (num, unit_secs) = if let Some(n) = s.strip_suffix("ms") {
        (n, 0.001)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1.0)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60.0)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3600.0)
    } else {
        (s, 1.0)
    };
    let value: f64 = num
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration {:?} (use e.g. 500ms, 3s, 2m, 1h)", raw))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("invalid duration {:?}: must be zero or positive", raw));
    }
    Duration::try_from_secs_f64(value * unit_secs).map_err(|e| format!("invalid duration {:?}: {}", raw, e))
}

/// Seconds from the config file; negative or invalid becomes zero.
pub fn from_secs_lossy(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}
