use axum::{body::Bytes, extract::State, http::StatusCode};
use ircrelay_core::events::{ChatLine, ChatLineSender, decode};
use ircrelay_sdk::objects::endpoints::PACKETS_FIELD;

use crate::state::AppState;

/// `POST /push_buildbot` - relay finished builds.
///
/// The body is form-encoded; the `packets` field holds a JSON array of
/// buildbot events. Each decodable `buildFinished` event becomes one line.
pub(super) async fn push_buildbot(State(state): State<AppState>, body: Bytes) -> StatusCode {
    let Some(packets) = url::form_urlencoded::parse(&body)
        .find(|(key, _)| key == PACKETS_FIELD)
        .map(|(_, value)| value.into_owned())
    else {
        tracing::warn!(bytes = body.len(), "push_buildbot without a packets field");
        return StatusCode::OK;
    };

    let events = match decode(packets.as_bytes()) {
        Ok(events) => events,
        Err(e) => {
            tracing::warn!(error = %e, "Dropping malformed buildbot push");
            return StatusCode::OK;
        }
    };

    tracing::debug!(events = events.len(), "Decoded buildbot push");
    enqueue(&state.lines, events.iter().map(|event| event.as_chat_line())).await;
    StatusCode::OK
}

/// `POST /push_commit` - every `\n`-separated line of the body is posted
/// verbatim, empty lines included.
pub(super) async fn push_commit(State(state): State<AppState>, body: Bytes) -> StatusCode {
    let text = String::from_utf8_lossy(&body);
    let lines = ChatLine::commit_lines(&text);
    tracing::debug!(lines = lines.len(), "Received commit push");
    enqueue(&state.lines, lines).await;
    StatusCode::OK
}

/// Send lines in order, waiting for room when the session lags behind.
async fn enqueue(lines_tx: &ChatLineSender, lines: impl IntoIterator<Item = ChatLine>) {
    for line in lines {
        if lines_tx.send(line).await.is_err() {
            tracing::error!("Relay session is gone, dropping webhook lines");
            return;
        }
    }
}
