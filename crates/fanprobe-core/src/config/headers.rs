//! Extra request headers collected from `-H key:value` style input.

/// Extra headers in insertion order, plus the User-Agent slot.
///
/// Values are stored untrimmed; the request builder trims them on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraHeaders {
    user_agent: String,
    entries: Vec<(String, String)>,
}

impl ExtraHeaders {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            entries: Vec::new(),
        }
    }

    /// Raw User-Agent value. Empty means "don't send one".
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn set_user_agent(&mut self, value: impl Into<String>) {
        self.user_agent = value.into();
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Regular headers (never User-Agent or Host) in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
