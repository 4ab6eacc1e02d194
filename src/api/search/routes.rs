use crate::api::models::AppState;
use crate::api::search::handlers::{search_id_handler, search_recipes_handler};
use axum::{routing::{get, post}, Router};

pub fn routes() -> Router<AppState> {
    // `search` shadows the `{id}` segment, so the id verbs answer here.
    Router::new()
        .route(
            "/recipes/search",
            post(search_recipes_handler)
                .get(search_id_handler)
                .put(search_id_handler)
                .patch(search_id_handler)
                .delete(search_id_handler),
        )
        .route("/recipes/search/rating", post(search_id_handler))
}
