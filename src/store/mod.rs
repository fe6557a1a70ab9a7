//! Persistence interface and its backends.

mod memory;
mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::token::Token;
use crate::user::{CreditFields, User, UserId};

/// Storage operations needed by the authentication flows.
#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Find a user by exact email.
    async fn user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Find a user by id.
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>>;

    /// Persist a freshly issued token. Fails on a duplicate token value.
    async fn insert_token(&self, token: &Token) -> Result<()>;

    /// Look up a token row by its exact value.
    async fn token_by_value(&self, value: &str) -> Result<Option<Token>>;

    /// Delete a token row. Returns whether the row existed.
    async fn delete_token(&self, value: &str) -> Result<bool>;

    /// Replace the credit columns of a user, provided the row still holds the
    /// `expected` values. Returns `false` when another writer got there
    /// first; the caller re-reads and retries.
    async fn update_credits(
        &self,
        id: UserId,
        expected: &CreditFields,
        update: &CreditFields,
    ) -> Result<bool>;
}
