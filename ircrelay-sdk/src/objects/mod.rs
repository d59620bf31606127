pub mod buildbot;
pub mod endpoints;
pub mod health;

pub use buildbot::{BuildFinishedPayload, BuildProperties, BuildbotPacket};
pub use health::HealthResponse;
