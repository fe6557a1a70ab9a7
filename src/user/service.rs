//! Identity resolution: turn a verified session into an authorized user.
//!
//! Every resolution applies the daily credit grants before the active flag
//! is enforced, so a deactivated account still gets its mutations committed
//! and only then receives the refusal.

use chrono::{DateTime, Utc};

use crate::error::{Result, ServerError};
use crate::store::AuthStore;
use crate::user::{User, UserId, daily_grants};

/// Attempts before giving up on the guarded credit update.
const MAX_UPDATE_ATTEMPTS: usize = 4;

/// Load the user owning a verified session and settle the credit grants owed
/// at `now`.
///
/// Concurrent resolutions of the same user race on the guarded update; the
/// losers re-read and find nothing left to grant, so each grant lands exactly
/// once per day no matter how many requests arrive at once.
pub async fn resolve(
    store: &dyn AuthStore,
    id: UserId,
    now: DateTime<Utc>,
) -> Result<User> {
    for _ in 0..MAX_UPDATE_ATTEMPTS {
        let user = store
            .user_by_id(id)
            .await?
            .ok_or_else(|| token_owner_missing(id))?;

        let Some(update) = daily_grants(&user, now) else {
            return require_active(user);
        };

        if store
            .update_credits(id, &user.credit_fields(), &update)
            .await?
        {
            return require_active(user.with_credit_fields(&update));
        }

        // Lost the race against a concurrent resolution; re-read the row.
    }

    Err(ServerError::Internal {
        details: format!("credit update for user {id} kept conflicting"),
        source: None,
    })
}

fn require_active(user: User) -> Result<User> {
    if user.is_active {
        Ok(user)
    } else {
        Err(ServerError::Inactive)
    }
}

// Tokens reference their owner; a dangling one is a server bug, not a
// client error.
fn token_owner_missing(id: UserId) -> ServerError {
    ServerError::Internal {
        details: format!("token owner {id} not found"),
        source: None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone};
    use tokio::task::JoinSet;

    use super::*;
    use crate::store::MemStore;
    use crate::user::{DAILY_REFILL, LOGIN_BONUS};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap()
    }

    fn refillable_user(id: UserId) -> User {
        User {
            id,
            email: format!("user-{id}@example.com"),
            is_active: true,
            credits: 0,
            last_credit_refill: Some(now() - Duration::days(1)),
            last_login_credit: None,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_resolve_settles_both_grants() {
        let store = MemStore::new();
        store.add_user(refillable_user(1));

        let user = resolve(&store, 1, now()).await.unwrap();

        assert_eq!(user.credits, DAILY_REFILL + LOGIN_BONUS);
        assert_eq!(user.last_credit_refill, Some(now()));
        assert_eq!(user.last_login_credit, Some(now()));
    }

    #[tokio::test]
    async fn test_repeated_resolves_grant_once() {
        let store = MemStore::new();
        store.add_user(refillable_user(1));

        for _ in 0..5 {
            resolve(&store, 1, now()).await.unwrap();
        }

        let user = store.user_by_id(1).await.unwrap().unwrap();
        assert_eq!(user.credits, DAILY_REFILL + LOGIN_BONUS);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_resolves_grant_once() {
        let store = Arc::new(MemStore::new());
        store.add_user(refillable_user(1));

        let mut set = JoinSet::new();
        for _ in 0..50 {
            let store = Arc::clone(&store);
            set.spawn(async move { resolve(store.as_ref(), 1, now()).await });
        }
        while let Some(result) = set.join_next().await {
            result.unwrap().unwrap();
        }

        let user = store.user_by_id(1).await.unwrap().unwrap();
        assert_eq!(user.credits, DAILY_REFILL + LOGIN_BONUS);
    }

    #[tokio::test]
    async fn test_inactive_user_commits_then_fails() {
        let store = MemStore::new();
        store.add_user(User {
            is_active: false,
            ..refillable_user(1)
        });

        let error = resolve(&store, 1, now()).await.unwrap_err();
        assert!(matches!(error, ServerError::Inactive));

        // The refusal comes after the grants were committed.
        let user = store.user_by_id(1).await.unwrap().unwrap();
        assert_eq!(user.credits, DAILY_REFILL + LOGIN_BONUS);
    }

    #[tokio::test]
    async fn test_missing_owner_is_a_server_error() {
        let error = resolve(&MemStore::new(), 1, now()).await.unwrap_err();
        assert!(matches!(error, ServerError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_null_refill_timestamp_blocks_refill() {
        let store = MemStore::new();
        store.add_user(User {
            last_credit_refill: None,
            ..refillable_user(1)
        });

        let user = resolve(&store, 1, now()).await.unwrap();

        assert_eq!(user.credits, LOGIN_BONUS);
        assert_eq!(user.last_credit_refill, None);
    }

    #[tokio::test]
    async fn test_nothing_owed_leaves_the_row_alone() {
        let store = MemStore::new();
        let settled = User {
            credits: 4,
            last_credit_refill: None,
            last_login_credit: Some(now() - Duration::hours(2)),
            ..refillable_user(1)
        };
        store.add_user(settled.clone());

        let user = resolve(&store, 1, now()).await.unwrap();
        assert_eq!(user, settled);
    }
}
