use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/meetings", post(handlers::meeting::request_meeting))
        .route("/api/meetings", get(handlers::meeting::list_my_meetings))
        .route(
            "/api/meetings/with/:user_id",
            get(handlers::meeting::list_meetings_with),
        )
        .route(
            "/api/meetings/:id/accept",
            post(handlers::meeting::accept_meeting),
        )
        .route(
            "/api/meetings/:id/reject",
            post(handlers::meeting::reject_meeting),
        )
        .route(
            "/api/meetings/:id/cancel",
            post(handlers::meeting::cancel_meeting),
        )
        .route(
            "/api/meetings/:id/reschedule",
            post(handlers::meeting::propose_reschedule),
        )
}
