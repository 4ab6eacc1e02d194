use crate::storage::{Page, RecipeDraft, RecipeStore, StoreError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;
use std::sync::Arc;
use tracing::error;

/// Largest page a listing or search may return
pub const MAX_PAGE_SIZE: i64 = 10;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecipeStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecipeStore>) -> Self {
        Self { store }
    }
}

/// Body of create and update requests
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeRequest {
    pub name: String,

    #[serde(default)]
    pub preptime: f64,

    pub difficulty: i32,

    #[serde(default)]
    pub vegetarian: bool,
}

impl RecipeRequest {
    /// Validate the request
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::invalid_payload());
        }
        Ok(())
    }

    pub fn into_draft(self) -> RecipeDraft {
        RecipeDraft {
            name: self.name,
            preptime: self.preptime,
            difficulty: self.difficulty,
            vegetarian: self.vegetarian,
        }
    }
}

/// Body of a rating submission
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RatingRequest {
    pub rating: i32,
}

/// A rating as stored
#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub recipe_id: i64,
    pub rating_id: i64,
    pub rating: i32,
}

/// Raw `count`/`start` values; unparseable input falls back to defaults
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub count: Option<String>,
    pub start: Option<String>,
}

impl PageQuery {
    /// Clamp into a page: `count` outside 1..=10 becomes 10, a negative
    /// `start` becomes 0. Unparseable values count as zero and values past
    /// the `i64` range saturate.
    pub fn page(&self) -> Page {
        let count = parse_saturating(self.count.as_deref());
        let start = parse_saturating(self.start.as_deref());

        Page {
            limit: if (1..=MAX_PAGE_SIZE).contains(&count) {
                count
            } else {
                MAX_PAGE_SIZE
            },
            offset: start.max(0),
        }
    }
}

fn parse_saturating(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else {
        return 0;
    };
    match raw.parse::<i64>() {
        Ok(value) => value,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => 0,
        },
    }
}

/// Search form fields
#[derive(Debug, Default)]
pub struct SearchParams {
    pub page: PageQuery,
    pub preptime: Option<String>,
}

impl SearchParams {
    /// Upper bound on preptime. Absent or empty means no bound; a value
    /// that does not parse bounds at zero.
    pub fn max_preptime(&self) -> Option<f64> {
        self.preptime
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| v.parse().unwrap_or(0.0))
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub result: &'static str,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    MethodNotAllowed(String),
    Internal(String),
}

impl AppError {
    pub fn invalid_id() -> Self {
        AppError::BadRequest("Invalid recipe ID".to_string())
    }

    pub fn invalid_payload() -> Self {
        AppError::BadRequest("Invalid request payload".to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::MethodNotAllowed(msg) => (StatusCode::METHOD_NOT_ALLOWED, msg),
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
