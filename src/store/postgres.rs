//! PostgreSQL [`AuthStore`] backend.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::Postgres;
use crate::error::Result;
use crate::store::AuthStore;
use crate::token::Token;
use crate::user::{CreditFields, User, UserId};

pub const DEFAULT_CREDENTIALS: &str = "postgres";
pub const DEFAULT_DATABASE_NAME: &str = "authd";
pub const DEFAULT_POOL_SIZE: u32 = 10;

const USER_COLUMNS: &str = "id, email, password_hash, is_active, is_admin, \
                            credits, last_credit_refill, last_login_credit";

/// Store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the configured PostgreSQL instance.
    pub async fn connect(config: &Postgres) -> std::result::Result<Self, sqlx::Error> {
        let username = config.username.as_deref().unwrap_or(DEFAULT_CREDENTIALS);
        let password = config.password.as_deref().unwrap_or(DEFAULT_CREDENTIALS);
        let database = config.database.as_deref().unwrap_or(DEFAULT_DATABASE_NAME);
        let hostname = &config.address;
        let addr = format!("postgres://{username}:{password}@{hostname}/{database}");

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size.unwrap_or(DEFAULT_POOL_SIZE))
            .connect(&addr)
            .await?;

        tracing::info!(%hostname, %database, "postgres connected");

        Ok(Self { pool })
    }

    /// Underlying pool, used to run migrations.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AuthStore for PgStore {
    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert_token(&self, token: &Token) -> Result<()> {
        sqlx::query(
            "INSERT INTO tokens (token, user_id, created_at) VALUES ($1, $2, $3)",
        )
        .bind(&token.token)
        .bind(token.user_id)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn token_by_value(&self, value: &str) -> Result<Option<Token>> {
        let token = sqlx::query_as::<_, Token>(
            "SELECT token, user_id, created_at FROM tokens WHERE token = $1",
        )
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn delete_token(&self, value: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tokens WHERE token = $1")
            .bind(value)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_credits(
        &self,
        id: UserId,
        expected: &CreditFields,
        update: &CreditFields,
    ) -> Result<bool> {
        // Single-statement compare-and-set. `IS NOT DISTINCT FROM` makes the
        // guard hold for NULL timestamps as well.
        let result = sqlx::query(
            "UPDATE users \
                SET credits = $2, last_credit_refill = $3, last_login_credit = $4 \
                WHERE id = $1 \
                    AND credits = $5 \
                    AND last_credit_refill IS NOT DISTINCT FROM $6 \
                    AND last_login_credit IS NOT DISTINCT FROM $7",
        )
        .bind(id)
        .bind(update.credits)
        .bind(update.last_credit_refill)
        .bind(update.last_login_credit)
        .bind(expected.credits)
        .bind(expected.last_credit_refill)
        .bind(expected.last_login_credit)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
