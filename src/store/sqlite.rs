//! SQLite-backed token store.
//!
//! Owns the `tokens` table and enforces its invariants: names are unique
//! across active and inactive rows, ids are never reused, and rows are
//! deactivated instead of deleted.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::errors::StoreError;
use crate::models::{StatusFilter, Token};

const ALREADY_ACTIVE: &str = "token already exists and is active";

#[derive(Clone)]
pub struct TokenStore {
    pool: SqlitePool,
}

/// Result of the insert half of `create_or_reactivate`.
#[derive(Debug)]
enum InsertOutcome {
    Inserted(Token),
    /// The unique constraint on `name` rejected the row.
    NameTaken,
}

/// Result of the reactivation half of `create_or_reactivate`.
#[derive(Debug)]
enum Reactivation {
    Reactivated(Token),
    AlreadyActive,
    /// The row that blocked the insert is gone.
    Missing,
}

impl TokenStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // -- Token Operations --

    /// Create a token, or bring back the inactive token that already owns `name`.
    /// The name is stored exactly as given; blank names are rejected.
    ///
    /// Runs as two transactions: the insert is attempted first and rolled back
    /// if the unique constraint fires, then the existing row is looked up and
    /// flipped to active. Only a unique violation takes the second path; every
    /// other failure is reported as a conflict.
    pub async fn create_or_reactivate(&self, name: &str) -> Result<Token, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidName);
        }

        match self.try_insert(name).await {
            Ok(InsertOutcome::Inserted(token)) => {
                tracing::info!(id = token.id, name = %token.name, "token created");
                Ok(token)
            }
            Ok(InsertOutcome::NameTaken) => self.reactivate(name).await,
            Err(e) => {
                tracing::warn!(name, "token insert failed: {}", e);
                Err(StoreError::Conflict(format!(
                    "could not create token '{}'",
                    name
                )))
            }
        }
    }

    /// Attempt the insert inside its own transaction.
    async fn try_insert(&self, name: &str) -> Result<InsertOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, Token>(
            "INSERT INTO tokens (name, active) VALUES (?, ?) RETURNING id, name, active",
        )
        .bind(name)
        .bind(true)
        .fetch_one(&mut *tx)
        .await;

        match inserted {
            Ok(token) => {
                tx.commit().await?;
                Ok(InsertOutcome::Inserted(token))
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                tx.rollback().await?;
                Ok(InsertOutcome::NameTaken)
            }
            Err(e) => Err(e),
        }
    }

    async fn reactivate(&self, name: &str) -> Result<Token, StoreError> {
        match self.reactivate_tx(name).await {
            Ok(Reactivation::Reactivated(token)) => {
                tracing::info!(id = token.id, name = %token.name, "token reactivated");
                Ok(token)
            }
            Ok(Reactivation::AlreadyActive) => {
                tracing::debug!(name, "create rejected, token is active");
                Err(StoreError::Conflict(ALREADY_ACTIVE.to_string()))
            }
            Ok(Reactivation::Missing) => {
                tracing::warn!(name, "token vanished between insert and reactivation");
                Err(StoreError::Conflict(format!(
                    "could not reactivate token '{}'",
                    name
                )))
            }
            Err(e) => {
                tracing::warn!(name, "token reactivation failed: {}", e);
                Err(StoreError::Conflict(format!(
                    "could not reactivate token '{}'",
                    name
                )))
            }
        }
    }

    async fn reactivate_tx(&self, name: &str) -> Result<Reactivation, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Token>(
            "SELECT id, name, active FROM tokens WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = match existing {
            None => Reactivation::Missing,
            Some(token) if token.active => Reactivation::AlreadyActive,
            Some(token) => {
                let token = sqlx::query_as::<_, Token>(
                    "UPDATE tokens SET active = ? WHERE id = ? RETURNING id, name, active",
                )
                .bind(true)
                .bind(token.id)
                .fetch_one(&mut *tx)
                .await?;
                tx.commit().await?;
                return Ok(Reactivation::Reactivated(token));
            }
        };

        tx.rollback().await?;
        Ok(outcome)
    }

    /// List tokens matching `filter`, oldest first.
    pub async fn list(&self, filter: StatusFilter) -> Result<Vec<Token>, StoreError> {
        let rows = match filter.as_active() {
            Some(active) => {
                sqlx::query_as::<_, Token>(
                    "SELECT id, name, active FROM tokens WHERE active = ? ORDER BY id ASC",
                )
                .bind(active)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Token>("SELECT id, name, active FROM tokens ORDER BY id ASC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> Result<Token, StoreError> {
        sqlx::query_as::<_, Token>("SELECT id, name, active FROM tokens WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    /// Flip the `active` flag. `id` and `name` are left untouched.
    pub async fn set_active(&self, id: i64, active: bool) -> Result<Token, StoreError> {
        let token = sqlx::query_as::<_, Token>(
            "UPDATE tokens SET active = ? WHERE id = ? RETURNING id, name, active",
        )
        .bind(active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))?;

        tracing::info!(id, active, "token status updated");
        Ok(token)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tokens")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}
