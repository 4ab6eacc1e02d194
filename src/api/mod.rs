pub mod extract;
pub mod models;
pub mod ratings;
pub mod recipes;
pub mod search;


// Re-exports
pub use models::*;

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::warn;

const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Full application router: `/health` plus every resource under `/v1`.
pub fn router(state: AppState) -> Router {
    let v1 = Router::new()
        .merge(recipes::routes())
        .merge(ratings::routes())
        .merge(search::routes())
        .method_not_allowed_fallback(method_not_allowed_handler);

    Router::new()
        .route("/health", get(health_handler))
        .method_not_allowed_fallback(method_not_allowed_handler)
        .nest("/v1", v1)
        .fallback(not_found_handler)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetResponseHeaderLayer::overriding(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(JSON_UTF8),
                )),
        )
}

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let version = env!("CARGO_PKG_VERSION");
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                version,
                error: None,
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    version,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

async fn not_found_handler() -> AppError {
    AppError::NotFound("Not found".to_string())
}

async fn method_not_allowed_handler() -> AppError {
    AppError::MethodNotAllowed("Method not allowed".to_string())
}
