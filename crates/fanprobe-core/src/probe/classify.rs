//! Classify a response status against the expected code.

/// What a status code means for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Ok,
    /// Not counted for retries or the exit code.
    Warning,
    Error,
}

/// `expected == 0`: 200 is ok, anything else a warning.
/// Otherwise only `expected` is ok and anything else is an error.
pub fn classify_status(code: u16, expected: u16) -> Verdict {
    if expected > 0 {
        if code == expected {
            Verdict::Ok
        } else {
            Verdict::Error
        }
    } else if code == 200 {
        Verdict::Ok
    } else {
        Verdict::Warning
    }
}
