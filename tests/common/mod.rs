#![allow(dead_code)]

use chute::{
    auth::SecretScheme,
    profiles::{ProfileChange, ProfileId},
    store, AppState,
};

pub async fn app() -> AppState {
    let db_pool = store::memory().await.expect("in-memory database");
    AppState::new(db_pool, SecretScheme::default())
}

pub async fn profile(app: &AppState) -> ProfileId {
    app.profiles.create().await.expect("profile")
}

/// A profile carrying exactly the given tags.
pub async fn tagged(app: &AppState, utypes: &[i64], flags: &[i64]) -> ProfileId {
    let id = profile(app).await;
    app.profiles
        .update(
            id,
            ProfileChange {
                utypes: utypes.to_vec(),
                flags: flags.to_vec(),
                ..Default::default()
            },
        )
        .await
        .expect("tags");
    id
}
