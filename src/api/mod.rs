//! REST API layer: route handlers, DTOs, router composition, and the
//! OpenAPI document.
//!
//! Resource endpoints are mounted under `/api/v1`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI description of every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "realtime-hub", description = "Presence and notification fan-out hub"),
    paths(
        handlers::system::health_handler,
        handlers::presence::list_online_users,
        handlers::presence::get_user_presence,
        handlers::presence::get_stats,
        handlers::notification::push_notification,
        handlers::notification::push_notification_read,
        handlers::notification::push_system_message,
    ),
    tags(
        (name = "System", description = "Service health"),
        (name = "Presence", description = "Who is online"),
        (name = "Notifications", description = "Live event pushes"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
