use crate::api::extract::SearchForm;
use crate::api::models::*;
use crate::storage::RatedRecipe;
use axum::{extract::State, Json};
use tracing::info;

pub async fn search_recipes_handler(
    State(state): State<AppState>,
    SearchForm(params): SearchForm,
) -> Result<Json<Vec<RatedRecipe>>, AppError> {
    let page = params.page.page();
    let max_preptime = params.max_preptime();

    info!(?max_preptime, offset = page.offset, limit = page.limit, "Searching recipes");

    let recipes = state.store.search_recipes(max_preptime, page).await?;

    info!(found = recipes.len(), "Search complete");

    Ok(Json(recipes))
}

/// `search` in an id position is a non-numeric id like any other.
pub async fn search_id_handler() -> AppError {
    AppError::invalid_id()
}
