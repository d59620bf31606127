use serde::{Deserialize, Serialize};

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// State of the outbound chat session (`disconnected`, `connecting`, `connected`).
    pub session: String,
    /// Number of documentation pages currently known.
    pub doc_pages: usize,
}
