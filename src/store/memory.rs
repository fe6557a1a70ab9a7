//! In-memory [`AuthStore`] backend.
//!
//! Used as fallback when no `postgres` entry is configured; nothing survives
//! a restart. Also backs the test suite.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, ServerError};
use crate::store::AuthStore;
use crate::token::Token;
use crate::user::{CreditFields, User, UserId};

/// Store backed by process memory.
#[derive(Default)]
pub struct MemStore {
    users: Mutex<HashMap<UserId, User>>,
    tokens: Mutex<HashMap<String, Token>>,
}

impl MemStore {
    /// Create an empty [`MemStore`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user row.
    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    #[cfg(test)]
    pub(crate) fn token_count(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }
}

#[async_trait]
impl AuthStore for MemStore {
    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn insert_token(&self, token: &Token) -> Result<()> {
        let mut tokens = self.tokens.lock().unwrap();

        if tokens.contains_key(&token.token) {
            return Err(ServerError::Internal {
                details: "duplicate token value".to_owned(),
                source: None,
            });
        }

        tokens.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn token_by_value(&self, value: &str) -> Result<Option<Token>> {
        Ok(self.tokens.lock().unwrap().get(value).cloned())
    }

    async fn delete_token(&self, value: &str) -> Result<bool> {
        Ok(self.tokens.lock().unwrap().remove(value).is_some())
    }

    async fn update_credits(
        &self,
        id: UserId,
        expected: &CreditFields,
        update: &CreditFields,
    ) -> Result<bool> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.get_mut(&id) else {
            return Ok(false);
        };

        if user.credit_fields() != *expected {
            return Ok(false);
        }

        user.credits = update.credits;
        user.last_credit_refill = update.last_credit_refill;
        user.last_login_credit = update.last_login_credit;
        Ok(true)
    }
}
