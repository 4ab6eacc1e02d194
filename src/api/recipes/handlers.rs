use crate::api::extract::{JsonBody, RecipeId};
use crate::api::models::*;
use crate::storage::Recipe;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};

pub async fn get_recipe_handler(
    State(state): State<AppState>,
    RecipeId(id): RecipeId,
) -> Result<Json<Recipe>, AppError> {
    let recipe = state
        .store
        .get_recipe(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;

    Ok(Json(recipe))
}

pub async fn list_recipes_handler(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Vec<Recipe>>, AppError> {
    let page = query.map(|Query(q)| q).unwrap_or_default().page();
    let recipes = state.store.list_recipes(page).await?;

    info!(offset = page.offset, limit = page.limit, found = recipes.len(), "Listed recipes");

    Ok(Json(recipes))
}

pub async fn create_recipe_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RecipeRequest>,
) -> Result<(StatusCode, Json<Recipe>), AppError> {
    request.validate()?;

    let draft = request.into_draft();
    let id = state.store.create_recipe(&draft).await?;

    info!(id, name = %draft.name, "Recipe created");

    Ok((StatusCode::CREATED, Json(draft.with_id(id))))
}

/// Serves both PUT and PATCH. Every mutable field is replaced.
pub async fn update_recipe_handler(
    State(state): State<AppState>,
    RecipeId(id): RecipeId,
    JsonBody(request): JsonBody<RecipeRequest>,
) -> Result<Json<Recipe>, AppError> {
    request.validate()?;

    let draft = request.into_draft();
    let updated = state.store.update_recipe(id, &draft).await?;

    // An unknown id still answers 200 with the submitted data.
    if updated == 0 {
        warn!(id, "Update matched no recipe");
    } else {
        info!(id, "Recipe updated");
    }

    Ok(Json(draft.with_id(id)))
}

pub async fn delete_recipe_handler(
    State(state): State<AppState>,
    RecipeId(id): RecipeId,
) -> Result<Json<StatusResponse>, AppError> {
    let deleted = state.store.delete_recipe(id).await?;

    info!(id, deleted, "Recipe deleted");

    Ok(Json(StatusResponse { result: "success" }))
}
