//! Buildbot status-push packet shapes.
//!
//! Buildbot's HTTP status push sends a JSON array of packets, each tagged
//! with an `event` name. Only the envelope is strictly typed; the payload
//! stays a raw [`Value`] because buildbot mixes strings, numbers and nulls
//! freely inside it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminator of the packet announcing a finished build.
pub const BUILD_FINISHED_EVENT: &str = "buildFinished";

/// One entry of the status-push array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildbotPacket {
    pub event: String,
    #[serde(default)]
    pub payload: Value,
}

impl BuildbotPacket {
    /// Build a `buildFinished` packet carrying the given `(key, value)`
    /// properties. Every property gets `"relay"` as its source column.
    pub fn build_finished<'a>(properties: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let properties = properties
            .into_iter()
            .map(|(key, value)| Value::Array(vec![key.into(), value.into(), "relay".into()]))
            .collect();
        let payload = BuildFinishedPayload {
            build: BuildProperties { properties },
        };
        Self {
            event: BUILD_FINISHED_EVENT.to_owned(),
            payload: serde_json::to_value(payload).unwrap_or_default(),
        }
    }
}

/// Payload of a `buildFinished` packet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildFinishedPayload {
    #[serde(default)]
    pub build: BuildProperties,
}

/// The `build` object. `properties` is a list of `[key, value, source]`
/// triples, but nothing guarantees that shape, so entries stay untyped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildProperties {
    #[serde(default)]
    pub properties: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_without_payload_parses() {
        let packets: Vec<BuildbotPacket> =
            serde_json::from_str(r#"[{"event": "stepStarted"}]"#).unwrap();
        assert_eq!(packets[0].event, "stepStarted");
        assert!(packets[0].payload.is_null());
    }

    #[test]
    fn test_build_finished_constructor_shape() {
        let packet = BuildbotPacket::build_finished([("buildername", "docs")]);
        assert_eq!(packet.event, BUILD_FINISHED_EVENT);
        assert_eq!(
            packet.payload["build"]["properties"][0],
            serde_json::json!(["buildername", "docs", "relay"])
        );
    }
}
