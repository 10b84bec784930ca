mod actor;
mod auths;
mod login;
mod logout;
mod secret;
mod store;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub use actor::{Actor, TOKEN_HEADER};
pub use secret::{Secret, SecretScheme, DEFAULT_ANONYMOUS_SALT};
pub use store::{Credential, CredentialStore};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profiles/self", post(login::register))
        .route("/actions/login", post(login::login))
        .route("/actions/logout", post(logout::logout))
        .route("/profiles/self/auths", get(auths::auths).post(auths::change_auth))
}
