use crate::api::models::AppState;
use crate::api::recipes::handlers::{
    create_recipe_handler, delete_recipe_handler, get_recipe_handler, list_recipes_handler,
    update_recipe_handler,
};
use axum::{routing::get, Router};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes_handler).post(create_recipe_handler))
        .route(
            "/recipes/{id}",
            get(get_recipe_handler)
                .put(update_recipe_handler)
                .patch(update_recipe_handler)
                .delete(delete_recipe_handler),
        )
}
