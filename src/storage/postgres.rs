use super::{Page, RatedRecipe, Recipe, RecipeDraft, RecipeStore, StoreError};
use crate::config::DatabaseConfig;
use async_trait::async_trait;
use sqlx::error::ErrorKind;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use std::str::FromStr;
use tracing::{debug, info};

// `INT4` rather than `INTEGER`: CockroachDB reads `INTEGER` as `INT8`, which
// does not decode into the `i32` fields.
const CREATE_RECIPES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS recipes (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    preptime DOUBLE PRECISION NOT NULL DEFAULT 0.0,
    difficulty INT4 NOT NULL CHECK (difficulty > 0) CHECK (difficulty < 4),
    vegetarian BOOLEAN NOT NULL DEFAULT false
)"#;

const CREATE_RATINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS recipe_ratings (
    recipe_id BIGINT NOT NULL REFERENCES recipes (id) ON DELETE CASCADE,
    rating_id BIGSERIAL,
    rating INT4 NOT NULL CHECK (rating > 0) CHECK (rating < 6),
    PRIMARY KEY (recipe_id, rating_id)
)"#;

// The page is applied to the filtered recipe set before the join so that
// recipes with many ratings still count once towards the limit.
const SEARCH_RATED: &str = r#"
SELECT r.id, r.name, r.preptime, r.difficulty, r.vegetarian,
       AVG(rr.rating)::DOUBLE PRECISION AS avg_rating
FROM (
    SELECT id, name, preptime, difficulty, vegetarian
    FROM recipes
    WHERE $1::DOUBLE PRECISION IS NULL OR preptime <= $1
    ORDER BY id
    LIMIT $2 OFFSET $3
) AS r
LEFT JOIN recipe_ratings AS rr ON rr.recipe_id = r.id
GROUP BY r.id, r.name, r.preptime, r.difficulty, r.vegetarian
ORDER BY r.id"#;

/// Recipe store backed by a PostgreSQL (or CockroachDB) connection pool
#[derive(Clone)]
pub struct PgRecipeStore {
    pool: PgPool,
}

impl PgRecipeStore {
    /// Open a pool against the configured database.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let options = connect_options(config)?;

        info!(
            host = %options.get_host(),
            port = options.get_port(),
            max_connections = config.max_connections,
            "Connecting to recipe store"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(StoreError::Connect)?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create both tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in [CREATE_RECIPES_TABLE, CREATE_RATINGS_TABLE] {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("Recipe schema ready");
        Ok(())
    }
}

fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, StoreError> {
    if let Some(url) = &config.url {
        return PgConnectOptions::from_str(url).map_err(StoreError::Config);
    }

    let ssl_mode = PgSslMode::from_str(&config.sslmode).map_err(StoreError::Config)?;
    let mut options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .database(&config.name)
        .ssl_mode(ssl_mode);

    if let Some(password) = &config.password {
        options = options.password(password);
    }

    Ok(options)
}

/// Separate constraint rejections from every other database failure.
fn classify(err: sqlx::Error) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if matches!(
            db_err.kind(),
            ErrorKind::CheckViolation | ErrorKind::ForeignKeyViolation
        ) {
            debug!(message = db_err.message(), "Constraint violation");
            return StoreError::Constraint(db_err.message().to_string());
        }
    }
    StoreError::Query(err)
}

#[async_trait]
impl RecipeStore for PgRecipeStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_recipe(&self, id: i64) -> Result<Option<Recipe>, StoreError> {
        let recipe = sqlx::query_as::<_, Recipe>(
            "SELECT id, name, preptime, difficulty, vegetarian FROM recipes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(recipe)
    }

    async fn list_recipes(&self, page: Page) -> Result<Vec<Recipe>, StoreError> {
        let recipes = sqlx::query_as::<_, Recipe>(
            "SELECT id, name, preptime, difficulty, vegetarian FROM recipes \
             ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(recipes)
    }

    async fn create_recipe(&self, draft: &RecipeDraft) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO recipes (name, preptime, difficulty, vegetarian) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&draft.name)
        .bind(draft.preptime)
        .bind(draft.difficulty)
        .bind(draft.vegetarian)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn update_recipe(&self, id: i64, draft: &RecipeDraft) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE recipes SET name = $1, preptime = $2, difficulty = $3, vegetarian = $4 \
             WHERE id = $5",
        )
        .bind(&draft.name)
        .bind(draft.preptime)
        .bind(draft.difficulty)
        .bind(draft.vegetarian)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        Ok(result.rows_affected())
    }

    async fn delete_recipe(&self, id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn add_rating(&self, recipe_id: i64, rating: i32) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO recipe_ratings (recipe_id, rating) VALUES ($1, $2) RETURNING rating_id",
        )
        .bind(recipe_id)
        .bind(rating)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn search_recipes(
        &self,
        max_preptime: Option<f64>,
        page: Page,
    ) -> Result<Vec<RatedRecipe>, StoreError> {
        let recipes = sqlx::query_as::<_, RatedRecipe>(SEARCH_RATED)
            .bind(max_preptime)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(recipes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_DATABASE_URL: &str = "RECIPES_TEST_DATABASE_URL";

    async fn test_store() -> Option<PgRecipeStore> {
        let url = std::env::var(TEST_DATABASE_URL).ok()?;
        let config = DatabaseConfig {
            url: Some(url),
            ..DatabaseConfig::default()
        };
        let store = PgRecipeStore::connect(&config).await.unwrap();
        store.ensure_schema().await.unwrap();
        sqlx::query("TRUNCATE recipe_ratings, recipes RESTART IDENTITY CASCADE")
            .execute(&store.pool)
            .await
            .unwrap();
        Some(store)
    }

    fn draft(name: &str, preptime: f64, difficulty: i32) -> RecipeDraft {
        RecipeDraft {
            name: name.to_string(),
            preptime,
            difficulty,
            vegetarian: true,
        }
    }

    #[test]
    fn test_connect_options_from_fields() {
        let config = DatabaseConfig {
            host: "db.internal".to_string(),
            port: 5433,
            ..DatabaseConfig::default()
        };
        let options = connect_options(&config).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_database(), Some("recipes"));
    }

    #[test]
    fn test_connect_options_rejects_unknown_sslmode() {
        let config = DatabaseConfig {
            sslmode: "sometimes".to_string(),
            ..DatabaseConfig::default()
        };
        assert!(matches!(
            connect_options(&config),
            Err(StoreError::Config(_))
        ));
    }

    #[test]
    fn test_connect_options_rejects_bad_url() {
        let config = DatabaseConfig {
            url: Some("postgres://cook@kitchen:port/menu".to_string()),
            ..DatabaseConfig::default()
        };
        let err = connect_options(&config).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
        assert!(err.to_string().starts_with("invalid recipe store settings"));
    }

    #[test]
    fn test_schema_uses_four_byte_integers() {
        assert!(CREATE_RECIPES_TABLE.contains("difficulty INT4 NOT NULL"));
        assert!(CREATE_RATINGS_TABLE.contains("rating INT4 NOT NULL"));
        assert!(!CREATE_RECIPES_TABLE.contains("INTEGER"));
        assert!(!CREATE_RATINGS_TABLE.contains("INTEGER"));
    }

    #[test]
    fn test_connect_options_prefers_url() {
        let config = DatabaseConfig {
            url: Some("postgres://cook@kitchen:26257/menu".to_string()),
            ..DatabaseConfig::default()
        };
        let options = connect_options(&config).unwrap();
        assert_eq!(options.get_host(), "kitchen");
        assert_eq!(options.get_username(), "cook");
        assert_eq!(options.get_database(), Some("menu"));
    }

    // Runs as one scenario because every step resets and shares the same tables.
    #[tokio::test]
    async fn test_postgres_round_trip() {
        let Some(store) = test_store().await else {
            eprintln!("{TEST_DATABASE_URL} not set, skipping");
            return;
        };

        store.ping().await.unwrap();
        assert!(store.get_recipe(1).await.unwrap().is_none());

        let id = store.create_recipe(&draft("test recipe", 0.1, 2)).await.unwrap();
        assert_eq!(id, 1);
        let recipe = store.get_recipe(id).await.unwrap().unwrap();
        assert_eq!(recipe, draft("test recipe", 0.1, 2).with_id(1));

        assert_eq!(store.add_rating(id, 3).await.unwrap(), 1);
        assert_eq!(store.add_rating(id, 2).await.unwrap(), 2);
        assert!(matches!(
            store.add_rating(id, 6).await.unwrap_err(),
            StoreError::Constraint(_)
        ));
        assert!(matches!(
            store.add_rating(999, 3).await.unwrap_err(),
            StoreError::Constraint(_)
        ));

        for i in 0..12 {
            let preptime = f64::from(i + 1) * 10.0;
            store
                .create_recipe(&draft(&format!("Recipe {i}"), preptime, i % 3 + 1))
                .await
                .unwrap();
        }

        let page = Page { offset: 0, limit: 1 };
        let rated = store.search_recipes(Some(50.0), page).await.unwrap();
        assert_eq!(rated.len(), 1);
        assert_eq!(rated[0].avg_rating, Some(2.5));

        let page = Page { offset: 1, limit: 10 };
        let rated = store.search_recipes(None, page).await.unwrap();
        assert_eq!(rated.len(), 10);
        assert!(rated.iter().all(|r| r.avg_rating.is_none()));

        let rated = store.search_recipes(Some(30.0), page).await.unwrap();
        let ids: Vec<i64> = rated.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);

        let listed = store.list_recipes(Page { offset: 10, limit: 10 }).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].id, 11);

        assert_eq!(
            store.update_recipe(id, &draft("renamed", 11.11, 3)).await.unwrap(),
            1
        );
        assert_eq!(store.update_recipe(999, &draft("ghost", 1.0, 1)).await.unwrap(), 0);
        assert_eq!(store.get_recipe(id).await.unwrap().unwrap().name, "renamed");

        assert_eq!(store.delete_recipe(id).await.unwrap(), 1);
        assert_eq!(store.delete_recipe(id).await.unwrap(), 0);
        assert!(store.get_recipe(id).await.unwrap().is_none());

        // A rejected insert still consumes a sequence value, so this runs last.
        let err = store.create_recipe(&draft("too hard", 1.0, 4)).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));

        let orphaned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipe_ratings")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(orphaned, 0);
    }
}
