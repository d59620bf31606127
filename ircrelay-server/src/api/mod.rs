//! Webhook API handlers.
//!
//! # Endpoints
//!
//! - `POST /push_buildbot` – buildbot status push, form field `packets`
//! - `POST /push_commit`   – commit announcement, one chat line per body line
//!
//! Both always answer `200 OK`; malformed input is logged and dropped.

use axum::{Router, routing::post};
use ircrelay_sdk::objects::endpoints::{PUSH_BUILDBOT_PATH, PUSH_COMMIT_PATH};

use crate::state::AppState;

mod webhooks;

/// Build the webhook router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(PUSH_BUILDBOT_PATH, post(webhooks::push_buildbot))
        .route(PUSH_COMMIT_PATH, post(webhooks::push_commit))
}
