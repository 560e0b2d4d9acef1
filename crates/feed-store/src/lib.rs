//! Relational persistence for the feed generator: schema bootstrap, batched
//! writes, hour-partitioned post storage, and the candidate-selection query
//! the serving side runs per request.
//!
//! One [`Store`] wraps a `sqlx::PgPool`; every operation here issues plain
//! runtime-checked queries (`sqlx::query`/`query_as`), not the `query!`
//! macro family, since there is no live database available to build an
//! offline query cache against.

pub mod error;
pub mod follows_ops;
pub mod model;
pub mod partition;
pub mod posts_ops;
pub mod schema;

pub use error::StoreError;
pub use model::FollowRow;

use sqlx::PgPool;

const LOG_TARGET: &str = "feed::store";

#[derive(Debug, Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|source| StoreError::Connect { source })?;
        let store = Self { pool };
        store.bootstrap().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn bootstrap(&self) -> Result<(), StoreError> {
        schema::bootstrap(&self.pool).await
    }
}
