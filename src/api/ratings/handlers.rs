use crate::api::extract::{JsonBody, RecipeId};
use crate::api::models::*;
use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

pub async fn add_rating_handler(
    State(state): State<AppState>,
    RecipeId(recipe_id): RecipeId,
    JsonBody(request): JsonBody<RatingRequest>,
) -> Result<(StatusCode, Json<RatingResponse>), AppError> {
    let rating_id = state.store.add_rating(recipe_id, request.rating).await?;

    info!(recipe_id, rating_id, rating = request.rating, "Rating added");

    Ok((
        StatusCode::CREATED,
        Json(RatingResponse {
            recipe_id,
            rating_id,
            rating: request.rating,
        }),
    ))
}
