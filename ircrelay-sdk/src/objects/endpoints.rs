//! Paths served by the relay's HTTP listener.

/// Buildbot status push target. Expects a form-encoded `packets` field.
pub const PUSH_BUILDBOT_PATH: &str = "/push_buildbot";

/// Commit announcement target. The raw body is split on `\n`.
pub const PUSH_COMMIT_PATH: &str = "/push_commit";

/// Liveness probe.
pub const HEALTH_PATH: &str = "/health";

/// Name of the form field carrying the JSON packet list.
pub const PACKETS_FIELD: &str = "packets";
