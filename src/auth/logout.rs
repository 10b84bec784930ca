use axum::{debug_handler, extract::State, http::StatusCode};
use tracing::info;

use crate::AppResult;

use super::{Actor, CredentialStore};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn logout(
    actor: Actor,
    State(credentials): State<CredentialStore>,
) -> AppResult<StatusCode> {
    credentials.logout(&actor.token).await?;
    info!(profile = %actor.profile, "logged out");
    Ok(StatusCode::NO_CONTENT)
}
