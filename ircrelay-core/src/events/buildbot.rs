//! Buildbot status-push decoding.
//!
//! The envelope (a JSON array of objects carrying an `event` string) must
//! parse, anything inside a recognized event is tolerated: missing
//! properties and odd value types degrade to empty fields.

use super::types::{ChatLine, Producer};
use ircrelay_sdk::objects::buildbot::{BUILD_FINISHED_EVENT, BuildFinishedPayload, BuildbotPacket};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while decoding a status push.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The envelope is not a JSON array of `{"event": ...}` objects.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

/// A buildbot event the relay knows how to announce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedEvent {
    BuildFinished(BuildFinished),
}

impl NormalizedEvent {
    /// Render the event as a line for the channel.
    pub fn as_chat_line(&self) -> ChatLine {
        match self {
            NormalizedEvent::BuildFinished(event) => ChatLine::new(
                Producer::Buildbot,
                format!(
                    "{} finished for {}{}",
                    event.builder_name, event.version_label, event.suffix
                ),
            ),
        }
    }
}

/// Fields of a `buildFinished` packet. Unset fields stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFinished {
    pub builder_name: String,
    pub version_label: String,
    pub suffix: String,
}

impl BuildFinished {
    /// Store one property. Unknown keys are dropped; a repeated key
    /// overwrites the earlier value.
    fn store(&mut self, key: &str, value: &str) {
        let field = match key {
            "buildername" => &mut self.builder_name,
            "gitversion" => &mut self.version_label,
            "ircsuffix" => &mut self.suffix,
            _ => return,
        };
        value.clone_into(field);
    }
}

type EventDecoder = fn(&Value) -> NormalizedEvent;

/// Discriminator -> decoder. Adding an event kind means adding a variant
/// and a row here.
const DECODERS: &[(&str, EventDecoder)] = &[(BUILD_FINISHED_EVENT, decode_build_finished)];

/// Decode a raw status push into the events the relay announces.
///
/// Packets with an unknown `event` are skipped.
pub fn decode(raw: &[u8]) -> Result<Vec<NormalizedEvent>, DecodeError> {
    let packets: Vec<BuildbotPacket> = serde_json::from_slice(raw)?;
    Ok(packets.iter().filter_map(decode_packet).collect())
}

/// Decode one packet, or `None` for an event kind we do not announce.
pub fn decode_packet(packet: &BuildbotPacket) -> Option<NormalizedEvent> {
    DECODERS
        .iter()
        .find(|(event, _)| *event == packet.event)
        .map(|(_, decoder)| decoder(&packet.payload))
}

fn decode_build_finished(payload: &Value) -> NormalizedEvent {
    let payload: BuildFinishedPayload =
        serde_json::from_value(payload.clone()).unwrap_or_default();

    let mut event = BuildFinished::default();
    for property in &payload.build.properties {
        // Every property is a triple: key, value, source.
        let Some([key, value, _]) = property.as_array().map(Vec::as_slice) else {
            continue;
        };
        // Buildbot also sends numbers and nulls; only strings are relevant.
        if let (Some(key), Some(value)) = (key.as_str(), value.as_str()) {
            event.store(key, value);
        }
    }

    NormalizedEvent::BuildFinished(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &str) -> Vec<String> {
        decode(raw.as_bytes())
            .unwrap()
            .iter()
            .map(|e| e.as_chat_line().into_text())
            .collect()
    }

    #[test]
    fn test_build_finished_renders_all_fields() {
        let raw = r#"[{"event": "buildFinished", "payload": {"build": {"properties": [
            ["buildername", "docs", "Builder"],
            ["gitversion", "4.2-123-gabcdef", "SetProperty"],
            ["ircsuffix", " (http://build.i3wm.org/docs/)", "SetProperty"]
        ]}}}]"#;
        assert_eq!(
            lines(raw),
            vec!["docs finished for 4.2-123-gabcdef (http://build.i3wm.org/docs/)"]
        );
    }

    #[test]
    fn test_unknown_event_yields_nothing() {
        let raw = r#"[{"event": "stepStarted", "payload": {}}]"#;
        assert!(decode(raw.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_non_string_value_dropped_without_affecting_others() {
        let raw = r#"[{"event": "buildFinished", "payload": {"build": {"properties": [
            ["buildername", "dist", "Builder"],
            ["gitversion", 42, "SetProperty"],
            ["ircsuffix", "!", "SetProperty"],
            [null, "ignored", "x"]
        ]}}}]"#;
        assert_eq!(lines(raw), vec!["dist finished for !"]);
    }

    #[test]
    fn test_malformed_tuples_skipped() {
        let raw = r#"[{"event": "buildFinished", "payload": {"build": {"properties": [
            ["buildername", "short"],
            "not-a-list",
            ["buildername", "x", "Builder", "extra"],
            ["gitversion", "v1", "SetProperty"]
        ]}}}]"#;
        assert_eq!(lines(raw), vec![" finished for v1"]);
    }

    #[test]
    fn test_missing_properties_degrade_to_empty_fields() {
        assert_eq!(
            lines(r#"[{"event": "buildFinished"}]"#),
            vec![" finished for "]
        );
        assert_eq!(
            lines(r#"[{"event": "buildFinished", "payload": {"build": {"properties": "oops"}}}]"#),
            vec![" finished for "]
        );
    }

    #[test]
    fn test_only_builder_set_is_degenerate_but_valid() {
        let raw = r#"[{"event": "buildFinished", "payload": {"build": {"properties": [
            ["buildername", "x", "Builder"]
        ]}}}]"#;
        assert_eq!(lines(raw), vec!["x finished for "]);
    }

    #[test]
    fn test_duplicate_key_last_write_wins() {
        let raw = r#"[{"event": "buildFinished", "payload": {"build": {"properties": [
            ["buildername", "first", "Builder"],
            ["buildername", "second", "Builder"]
        ]}}}]"#;
        assert_eq!(lines(raw), vec!["second finished for "]);
    }

    #[test]
    fn test_mixed_batch_keeps_order() {
        let raw = r#"[
            {"event": "buildFinished", "payload": {"build": {"properties": [["buildername", "a", "B"]]}}},
            {"event": "buildStarted", "payload": {}},
            {"event": "buildFinished", "payload": {"build": {"properties": [["buildername", "b", "B"]]}}}
        ]"#;
        assert_eq!(lines(raw), vec!["a finished for ", "b finished for "]);
    }

    #[test]
    fn test_envelope_errors_are_malformed() {
        for raw in ["", "not json", r#"{"event": "buildFinished"}"#, r#"[{"payload": {}}]"#, "[1]"] {
            assert!(
                matches!(decode(raw.as_bytes()), Err(DecodeError::MalformedPayload(_))),
                "expected malformed payload for {raw:?}"
            );
        }
    }

    #[test]
    fn test_sdk_constructed_packet_round_trips() {
        let packet = BuildbotPacket::build_finished([
            ("buildername", "tests"),
            ("gitversion", "4.3"),
        ]);
        let event = decode_packet(&packet).unwrap();
        assert_eq!(event.as_chat_line().text(), "tests finished for 4.3");
    }
}
