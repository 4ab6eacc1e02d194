pub mod postgres;

#[cfg(test)]
pub mod memory;

pub use postgres::PgRecipeStore;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// A stored recipe row
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub preptime: f64,
    pub difficulty: i32,
    pub vegetarian: bool,
}

/// The mutable fields of a recipe, written together on insert and update
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub name: String,
    pub preptime: f64,
    pub difficulty: i32,
    pub vegetarian: bool,
}

impl RecipeDraft {
    pub fn with_id(self, id: i64) -> Recipe {
        Recipe {
            id,
            name: self.name,
            preptime: self.preptime,
            difficulty: self.difficulty,
            vegetarian: self.vegetarian,
        }
    }
}

/// A recipe joined with the mean of its ratings
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RatedRecipe {
    pub id: i64,
    pub name: String,
    pub preptime: f64,
    pub difficulty: i32,
    pub vegetarian: bool,
    pub avg_rating: Option<f64>,
}

/// Offset/limit window over recipes ordered by id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid recipe store settings: {0}")]
    Config(#[source] sqlx::Error),

    #[error("failed to connect to the recipe store: {0}")]
    Connect(#[source] sqlx::Error),

    /// A check or foreign key constraint rejected the write
    #[error("{0}")]
    Constraint(String),

    #[error(transparent)]
    Query(#[from] sqlx::Error),
}

/// Persistence operations the HTTP layer depends on.
///
/// Each call issues a single statement; isolation between concurrent
/// writers is left to the database.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Round-trip to the store to prove it is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// `None` when no recipe has this id.
    async fn get_recipe(&self, id: i64) -> Result<Option<Recipe>, StoreError>;

    async fn list_recipes(&self, page: Page) -> Result<Vec<Recipe>, StoreError>;

    /// Returns the id assigned by the store.
    async fn create_recipe(&self, draft: &RecipeDraft) -> Result<i64, StoreError>;

    /// Overwrites every mutable field; returns the number of rows touched.
    async fn update_recipe(&self, id: i64, draft: &RecipeDraft) -> Result<u64, StoreError>;

    /// Deletes the recipe and, by cascade, its ratings.
    async fn delete_recipe(&self, id: i64) -> Result<u64, StoreError>;

    /// Returns the generated rating id.
    async fn add_rating(&self, recipe_id: i64, rating: i32) -> Result<i64, StoreError>;

    /// Recipes with `preptime <= max_preptime` (all recipes when `None`),
    /// each with its average rating. The page applies to recipes, not to
    /// joined rating rows.
    async fn search_recipes(
        &self,
        max_preptime: Option<f64>,
        page: Page,
    ) -> Result<Vec<RatedRecipe>, StoreError>;
}
