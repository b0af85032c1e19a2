use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::WebhookState;
use super::models::Update;

pub async fn webhook_handler(
    State(state): State<WebhookState>,
    Path(secret): Path<String>,
    Json(update): Json<Update>,
) -> StatusCode {
    if secret != *state.token {
        tracing::warn!("webhook called with unknown path");
        return StatusCode::NOT_FOUND;
    }
    tracing::debug!(update_id = update.update_id, "webhook update");
    state.dispatcher.dispatch(&update).await;
    StatusCode::OK
}
