use std::time::Duration;

/// Where the documentation index comes from and how links are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsConfig {
    /// Directory listing page scanned for `name.html` anchors.
    pub index_url: String,
    /// Prefix of emitted links, without a trailing slash.
    pub doc_base_url: String,
    pub refresh_interval: Duration,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            index_url: "http://code.stapelberg.de/git/i3-website/tree/docs".to_owned(),
            doc_base_url: "http://i3wm.org/docs".to_owned(),
            refresh_interval: Duration::from_secs(24 * 60 * 60),
        }
    }
}
