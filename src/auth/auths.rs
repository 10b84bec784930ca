use axum::{debug_handler, extract::State, Json};
use serde::Deserialize;

use crate::AppResult;

use super::{secret::Secret, Actor, Credential, CredentialStore};

#[derive(Deserialize)]
pub(crate) struct AuthChange {
    hash: String,
    username: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default = "authorized_by_default")]
    authorized: bool,
}

fn authorized_by_default() -> bool {
    true
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn auths(
    actor: Actor,
    State(credentials): State<CredentialStore>,
) -> AppResult<Json<Vec<Credential>>> {
    Ok(Json(credentials.list(actor.profile).await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn change_auth(
    actor: Actor,
    State(credentials): State<CredentialStore>,
    Json(AuthChange { hash, username, name, authorized }): Json<AuthChange>,
) -> AppResult<Json<Vec<Credential>>> {
    let secret = Secret::new(hash, username);
    Ok(Json(
        credentials
            .add_or_update(actor.profile, &secret, &name, authorized)
            .await?,
    ))
}
