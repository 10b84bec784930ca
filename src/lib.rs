pub mod appresult;
pub mod auth;
pub mod config;
pub mod error;
pub mod frees;
pub mod invites;
pub mod profiles;
pub mod store;

use axum::{extract::FromRef, Router};
use sqlx::SqlitePool;

pub use appresult::{AppError, AppResult};
pub use error::{Error, Result};

use auth::{CredentialStore, SecretScheme};
use frees::AvailabilityIndex;
use invites::InvitationEngine;
use profiles::Profiles;

/// Every component, each holding its own handle on the same pool.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub credentials: CredentialStore,
    pub freetimes: AvailabilityIndex,
    pub invites: InvitationEngine,
    pub profiles: Profiles,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, scheme: SecretScheme) -> Self {
        AppState {
            credentials: CredentialStore::new(db_pool.clone(), scheme),
            freetimes: AvailabilityIndex::new(db_pool.clone()),
            invites: InvitationEngine::new(db_pool.clone()),
            profiles: Profiles::new(db_pool),
        }
    }
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(profiles::router())
        .merge(frees::router())
        .merge(invites::router())
        .with_state(app_state)
}
