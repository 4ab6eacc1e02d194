use crate::api::models::AppState;
use crate::api::ratings::handlers::add_rating_handler;
use axum::{routing::post, Router};

pub fn routes() -> Router<AppState> {
    // Same parameter name as `/recipes/{id}`; the router rejects a different
    // name at the same position.
    Router::new()
        .route("/recipes/{id}/rating", post(add_rating_handler))
}
