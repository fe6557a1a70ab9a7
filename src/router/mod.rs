//! HTTP routes.

pub mod login;
pub mod logout;
pub mod status;
pub mod users;

#[cfg(test)]
pub(crate) fn state() -> (crate::AppState, std::sync::Arc<crate::store::MemStore>) {
    use std::sync::Arc;

    use crate::config::{Argon2, Configuration};
    use crate::crypto::PasswordManager;
    use crate::store::{AuthStore, MemStore};
    use crate::token::TokenManager;

    // Cheap hashing parameters; production values come from `config.yaml`.
    let argon2 = Argon2 {
        memory_cost: 1024,
        iterations: 1,
        parallelism: 1,
        hash_length: 32,
    };
    let config = Arc::new(Configuration {
        name: "authd-test".to_owned(),
        argon2: Some(argon2),
        ..Default::default()
    });

    let store = Arc::new(MemStore::new());
    let store_dyn: Arc<dyn AuthStore> = store.clone();
    let crypto =
        Arc::new(PasswordManager::new(config.argon2.clone()).expect("valid argon2 params"));
    let tokens = TokenManager::new(Arc::clone(&store_dyn), config.token.max_age_minutes);

    (
        crate::AppState {
            config,
            store: store_dyn,
            crypto,
            tokens,
        },
        store,
    )
}

#[cfg(test)]
pub(crate) fn seed_user(
    state: &crate::AppState,
    store: &crate::store::MemStore,
    id: crate::user::UserId,
    email: &str,
    password: &str,
) -> crate::user::User {
    let user = crate::user::User {
        id,
        email: email.to_owned(),
        password_hash: state.crypto.hash_password(password).expect("hashable password"),
        is_active: true,
        ..Default::default()
    };

    store.add_user(user.clone());
    user
}
