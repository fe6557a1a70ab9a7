//! Manage opaque session tokens.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{Result, ServerError};
use crate::store::AuthStore;
use crate::user::UserId;

/// Random bytes drawn for each token value.
pub const ENTROPY: usize = 32;
/// Length of an encoded token value: [`ENTROPY`] bytes, base64 without
/// padding.
pub const TOKEN_LENGTH: usize = 43;

/// Session token as saved on database. The value itself is the lookup key;
/// nothing is encoded in it.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Token {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Issue, verify and revoke session tokens.
#[derive(Clone)]
pub struct TokenManager {
    store: Arc<dyn AuthStore>,
    max_age: Duration,
}

impl TokenManager {
    /// Create a new [`TokenManager`] instance.
    pub fn new(store: Arc<dyn AuthStore>, max_age_minutes: i64) -> Self {
        Self {
            store,
            max_age: Duration::minutes(max_age_minutes),
        }
    }

    /// Draw a fresh token value from the OS random source.
    pub fn generate() -> String {
        let mut bytes = [0u8; ENTROPY];
        OsRng.fill_bytes(&mut bytes);

        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Issue a token bound to `user_id`, persisted before it is returned.
    pub async fn issue(&self, user_id: UserId, now: DateTime<Utc>) -> Result<Token> {
        let token = Token {
            token: Self::generate(),
            user_id,
            created_at: now,
        };

        self.store.insert_token(&token).await?;
        Ok(token)
    }

    /// Resolve a presented value to a live session.
    ///
    /// Expiry slides from issuance: a token created at the edge of the window
    /// is still valid. Unknown and expired values yield the same error, so a
    /// caller cannot probe which one it was.
    pub async fn verify(&self, value: &str, now: DateTime<Utc>) -> Result<Token> {
        self.store
            .token_by_value(value)
            .await?
            .filter(|token| token.created_at >= now - self.max_age)
            .ok_or(ServerError::InvalidToken)
    }

    /// Delete one token row. Expired rows stay behind until revoked this way.
    pub async fn revoke(&self, value: &str) -> Result<()> {
        if !self.store.delete_token(value).await? {
            tracing::debug!("token was already deleted");
        }

        Ok(())
    }
}
