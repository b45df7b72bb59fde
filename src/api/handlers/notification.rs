//! Push endpoints used by the business layer to emit live events.
//!
//! Delivery is best-effort: a 202 means the message was handed to the hub,
//! not that any client received it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{
    AcceptedResponse, NotificationReadRequest, NotifyRequest, SystemMessageRequest,
};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, HubError};

/// `POST /notifications` — Push a notification event.
///
/// # Errors
///
/// Returns [`HubError`] if the hub is shut down or the event cannot be
/// serialized.
#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    tag = "Notifications",
    summary = "Push a notification",
    description = "Sends a `notification` event to the notification's user, or to every connection when `user_id` is absent.",
    request_body = NotifyRequest,
    responses(
        (status = 202, description = "Handed to the hub", body = AcceptedResponse),
        (status = 503, description = "Hub shut down", body = ErrorResponse),
    )
)]
pub async fn push_notification(
    State(state): State<AppState>,
    Json(req): Json<NotifyRequest>,
) -> Result<impl IntoResponse, HubError> {
    let targeted = req.notification.user_id.is_some();
    state
        .notifier
        .notify_notification(req.notification, req.action)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(AcceptedResponse::new(targeted))))
}

/// `POST /notifications/read` — Push a read receipt.
///
/// # Errors
///
/// Returns [`HubError::InvalidRequest`] if no ids are given, or a hub error.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/read",
    tag = "Notifications",
    summary = "Push a read receipt",
    description = "Sends a `notification_read` event to every connection of the user.",
    request_body = NotificationReadRequest,
    responses(
        (status = 202, description = "Handed to the hub", body = AcceptedResponse),
        (status = 400, description = "Empty id list", body = ErrorResponse),
    )
)]
pub async fn push_notification_read(
    State(state): State<AppState>,
    Json(req): Json<NotificationReadRequest>,
) -> Result<impl IntoResponse, HubError> {
    if req.notification_ids.is_empty() {
        return Err(HubError::InvalidRequest(
            "notification_ids must not be empty".to_string(),
        ));
    }
    state
        .notifier
        .notify_notification_read(req.user_id, req.notification_ids)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(AcceptedResponse::new(true))))
}

/// `POST /system-messages` — Push a system message.
///
/// # Errors
///
/// Returns [`HubError::InvalidRequest`] if the message is blank, or a hub
/// error.
#[utoipa::path(
    post,
    path = "/api/v1/system-messages",
    tag = "Notifications",
    summary = "Push a system message",
    description = "Sends a `system_message` event to one user, or to every connection when `user_id` is absent.",
    request_body = SystemMessageRequest,
    responses(
        (status = 202, description = "Handed to the hub", body = AcceptedResponse),
        (status = 400, description = "Blank message", body = ErrorResponse),
    )
)]
pub async fn push_system_message(
    State(state): State<AppState>,
    Json(req): Json<SystemMessageRequest>,
) -> Result<impl IntoResponse, HubError> {
    if req.message.trim().is_empty() {
        return Err(HubError::InvalidRequest(
            "message must not be empty".to_string(),
        ));
    }
    let targeted = req.user_id.is_some();
    state
        .notifier
        .notify_system_message(req.message, req.level, req.user_id)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(AcceptedResponse::new(targeted))))
}

/// Push routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", post(push_notification))
        .route("/notifications/read", post(push_notification_read))
        .route("/system-messages", post(push_system_message))
}
