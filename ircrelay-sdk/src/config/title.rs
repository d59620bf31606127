use std::time::Duration;

/// Limits applied to a single link-title lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleConfig {
    /// Deadline for one fetch attempt, body scan included.
    pub timeout: Duration,
    /// Longest line buffered while looking for `<title>`; longer lines are
    /// scanned in chunks of this size.
    pub max_line_len: usize,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_line_len: 1024 * 1024,
        }
    }
}
