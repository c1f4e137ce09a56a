use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/slots", post(handlers::slot::declare_slots))
        .route("/api/slots", get(handlers::slot::list_my_slots))
        .route("/api/slots", delete(handlers::slot::clear_slots))
        .route("/api/slots/:id", delete(handlers::slot::remove_slot))
        .route("/api/users/:id/slots", get(handlers::slot::list_user_slots))
}
