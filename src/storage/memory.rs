//! In-process `RecipeStore` used by the HTTP tests.
//!
//! Mirrors the behaviour of the Postgres schema that matters to callers:
//! ids come from independent sequences starting at 1, the difficulty and
//! rating checks reject out-of-range values, ratings need an existing
//! recipe, and deleting a recipe drops its ratings.

use super::{Page, RatedRecipe, Recipe, RecipeDraft, RecipeStore, StoreError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy)]
struct StoredRating {
    recipe_id: i64,
    rating: i32,
}

#[derive(Default)]
struct Tables {
    recipes: BTreeMap<i64, Recipe>,
    ratings: BTreeMap<i64, StoredRating>,
    recipe_seq: i64,
    rating_seq: i64,
}

#[derive(Default)]
pub struct MemoryRecipeStore {
    tables: Mutex<Tables>,
    offline: bool,
}

impl MemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails, as if the database were down.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    fn tables(&self) -> Result<std::sync::MutexGuard<'_, Tables>, StoreError> {
        if self.offline {
            return Err(StoreError::Query(sqlx::Error::PoolTimedOut));
        }
        Ok(self.tables.lock().unwrap())
    }

    pub fn rating_count(&self) -> usize {
        self.tables.lock().unwrap().ratings.len()
    }
}

fn check_difficulty(draft: &RecipeDraft) -> Result<(), StoreError> {
    if (1..=3).contains(&draft.difficulty) {
        Ok(())
    } else {
        Err(StoreError::Constraint(
            "failed to satisfy CHECK constraint (difficulty > 0 AND difficulty < 4)".to_string(),
        ))
    }
}

fn window<T>(rows: impl Iterator<Item = T>, page: Page) -> impl Iterator<Item = T> {
    rows.skip(page.offset as usize).take(page.limit as usize)
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.tables().map(|_| ())
    }

    async fn get_recipe(&self, id: i64) -> Result<Option<Recipe>, StoreError> {
        Ok(self.tables()?.recipes.get(&id).cloned())
    }

    async fn list_recipes(&self, page: Page) -> Result<Vec<Recipe>, StoreError> {
        let tables = self.tables()?;
        Ok(window(tables.recipes.values().cloned(), page).collect())
    }

    async fn create_recipe(&self, draft: &RecipeDraft) -> Result<i64, StoreError> {
        let mut tables = self.tables()?;
        check_difficulty(draft)?;
        tables.recipe_seq += 1;
        let id = tables.recipe_seq;
        tables.recipes.insert(id, draft.clone().with_id(id));
        Ok(id)
    }

    async fn update_recipe(&self, id: i64, draft: &RecipeDraft) -> Result<u64, StoreError> {
        let mut tables = self.tables()?;
        check_difficulty(draft)?;
        match tables.recipes.get_mut(&id) {
            Some(recipe) => {
                *recipe = draft.clone().with_id(id);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_recipe(&self, id: i64) -> Result<u64, StoreError> {
        let mut tables = self.tables()?;
        if tables.recipes.remove(&id).is_none() {
            return Ok(0);
        }
        tables.ratings.retain(|_, r| r.recipe_id != id);
        Ok(1)
    }

    async fn add_rating(&self, recipe_id: i64, rating: i32) -> Result<i64, StoreError> {
        let mut tables = self.tables()?;
        if !(1..=5).contains(&rating) {
            return Err(StoreError::Constraint(
                "failed to satisfy CHECK constraint (rating > 0 AND rating < 6)".to_string(),
            ));
        }
        if !tables.recipes.contains_key(&recipe_id) {
            return Err(StoreError::Constraint(format!(
                "insert on table \"recipe_ratings\" violates foreign key constraint: \
                 recipe {recipe_id} does not exist"
            )));
        }
        tables.rating_seq += 1;
        let rating_id = tables.rating_seq;
        tables.ratings.insert(rating_id, StoredRating { recipe_id, rating });
        Ok(rating_id)
    }

    async fn search_recipes(
        &self,
        max_preptime: Option<f64>,
        page: Page,
    ) -> Result<Vec<RatedRecipe>, StoreError> {
        let tables = self.tables()?;
        let matching = tables
            .recipes
            .values()
            .filter(|r| max_preptime.is_none_or(|max| r.preptime <= max));

        let rated = window(matching, page)
            .map(|recipe| {
                let scores: Vec<i32> = tables
                    .ratings
                    .values()
                    .filter(|r| r.recipe_id == recipe.id)
                    .map(|r| r.rating)
                    .collect();
                let avg_rating = (!scores.is_empty()).then(|| {
                    f64::from(scores.iter().sum::<i32>()) / scores.len() as f64
                });
                RatedRecipe {
                    id: recipe.id,
                    name: recipe.name.clone(),
                    preptime: recipe.preptime,
                    difficulty: recipe.difficulty,
                    vegetarian: recipe.vegetarian,
                    avg_rating,
                }
            })
            .collect();

        Ok(rated)
    }
}
