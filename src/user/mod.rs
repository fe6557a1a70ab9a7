mod service;

pub use service::*;

use chrono::{DateTime, Utc};

pub type UserId = i64;

/// Credits granted when an empty balance refills for the day.
pub const DAILY_REFILL: i64 = 10;
/// Credits granted on the first authenticated request of the day.
pub const LOGIN_BONUS: i64 = 1;

/// User as saved on database.
#[derive(Clone, Debug, Default, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub credits: i64,
    pub last_credit_refill: Option<DateTime<Utc>>,
    pub last_login_credit: Option<DateTime<Utc>>,
}

/// Concurrently-mutated credit columns of a [`User`].
///
/// Doubles as the compare part of [`AuthStore::update_credits`]: a write only
/// lands when the row still holds the snapshot it was computed from.
///
/// [`AuthStore::update_credits`]: crate::store::AuthStore::update_credits
#[derive(Clone, Debug, PartialEq)]
pub struct CreditFields {
    pub credits: i64,
    pub last_credit_refill: Option<DateTime<Utc>>,
    pub last_login_credit: Option<DateTime<Utc>>,
}

impl User {
    /// Snapshot of the credit columns as read.
    pub fn credit_fields(&self) -> CreditFields {
        CreditFields {
            credits: self.credits,
            last_credit_refill: self.last_credit_refill,
            last_login_credit: self.last_login_credit,
        }
    }

    /// Copy of this user with the credit columns replaced.
    pub fn with_credit_fields(&self, fields: &CreditFields) -> User {
        User {
            credits: fields.credits,
            last_credit_refill: fields.last_credit_refill,
            last_login_credit: fields.last_login_credit,
            ..self.clone()
        }
    }
}

/// Compute the credit grants owed to `user` at `now`, over the snapshot the
/// caller read. Returns `None` when nothing is owed.
///
/// Days are UTC calendar dates. Both grants can land in the same call; each
/// fires at most once per day.
pub fn daily_grants(user: &User, now: DateTime<Utc>) -> Option<CreditFields> {
    let today = now.date_naive();
    let mut fields = user.credit_fields();
    let mut changed = false;

    // The refill only applies to accounts that have refilled before: a null
    // timestamp blocks it even at zero credits.
    if user.credits == 0
        && user
            .last_credit_refill
            .is_some_and(|refilled| refilled.date_naive() < today)
    {
        fields.credits += DAILY_REFILL;
        fields.last_credit_refill = Some(now);
        changed = true;
    }

    if user
        .last_login_credit
        .is_none_or(|granted| granted.date_naive() != today)
    {
        fields.credits += LOGIN_BONUS;
        fields.last_login_credit = Some(now);
        changed = true;
    }

    changed.then_some(fields)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn user(
        credits: i64,
        last_credit_refill: Option<DateTime<Utc>>,
        last_login_credit: Option<DateTime<Utc>>,
    ) -> User {
        User {
            id: 1,
            email: "user@example.com".to_owned(),
            is_active: true,
            credits,
            last_credit_refill,
            last_login_credit,
            ..Default::default()
        }
    }

    #[test]
    fn test_refill_and_bonus_stack() {
        let now = noon(2025, 3, 2);
        let fields =
            daily_grants(&user(0, Some(noon(2025, 3, 1)), None), now).unwrap();

        assert_eq!(fields.credits, DAILY_REFILL + LOGIN_BONUS);
        assert_eq!(fields.last_credit_refill, Some(now));
        assert_eq!(fields.last_login_credit, Some(now));
    }

    #[test]
    fn test_refill_requires_a_previous_refill() {
        let now = noon(2025, 3, 2);
        let fields = daily_grants(&user(0, None, None), now).unwrap();

        assert_eq!(fields.credits, LOGIN_BONUS);
        assert_eq!(fields.last_credit_refill, None);
    }

    #[test]
    fn test_refill_requires_an_empty_balance() {
        let now = noon(2025, 3, 2);
        let fields =
            daily_grants(&user(5, Some(noon(2025, 3, 1)), None), now).unwrap();

        assert_eq!(fields.credits, 5 + LOGIN_BONUS);
        assert_eq!(fields.last_credit_refill, Some(noon(2025, 3, 1)));
    }

    #[test]
    fn test_refill_fires_once_per_day() {
        let now = noon(2025, 3, 2);
        let earlier = now - Duration::hours(3);
        let fields =
            daily_grants(&user(0, Some(earlier), Some(noon(2025, 3, 1))), now)
                .unwrap();

        assert_eq!(fields.credits, LOGIN_BONUS);
        assert_eq!(fields.last_credit_refill, Some(earlier));
    }

    #[test]
    fn test_bonus_fires_once_per_day() {
        let now = noon(2025, 3, 2);
        let earlier = now - Duration::hours(3);

        assert_eq!(daily_grants(&user(3, None, Some(earlier)), now), None);
    }

    #[test]
    fn test_bonus_fires_on_a_new_day() {
        let now = noon(2025, 3, 2);
        let fields =
            daily_grants(&user(3, None, Some(noon(2025, 3, 1))), now).unwrap();

        assert_eq!(fields.credits, 3 + LOGIN_BONUS);
        assert_eq!(fields.last_login_credit, Some(now));
    }

    #[test]
    fn test_grants_converge_within_a_day() {
        let now = noon(2025, 3, 2);
        let before = user(0, Some(noon(2025, 3, 1)), None);
        let fields = daily_grants(&before, now).unwrap();
        let after = before.with_credit_fields(&fields);

        assert_eq!(daily_grants(&after, now), None);
        assert_eq!(daily_grants(&after, now + Duration::hours(5)), None);
    }
}
