use axum::{debug_handler, extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;

use crate::{profiles::Profiles, AppResult};

use super::{secret::Secret, CredentialStore, TOKEN_HEADER};

/// Body of register and login: the client-side hash of the secret and,
/// for password logins, the username.
#[derive(Deserialize)]
pub(crate) struct AuthRequest {
    pub(crate) hash: String,
    pub(crate) username: Option<String>,
    #[serde(default)]
    pub(crate) name: String,
}

impl AuthRequest {
    pub(crate) fn secret(&self) -> Secret {
        Secret::new(self.hash.clone(), self.username.clone())
    }
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn register(
    State(credentials): State<CredentialStore>,
    State(profiles): State<Profiles>,
    Json(request): Json<AuthRequest>,
) -> AppResult<impl IntoResponse> {
    let (profile, token) = credentials.register(&request.secret(), &request.name).await?;
    let profile = profiles.get(profile).await?;

    Ok((StatusCode::CREATED, [(TOKEN_HEADER, token)], Json(profile)))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn login(
    State(credentials): State<CredentialStore>,
    Json(request): Json<AuthRequest>,
) -> AppResult<impl IntoResponse> {
    let token = credentials.login(&request.secret()).await?;
    Ok(([(TOKEN_HEADER, token)], Json(serde_json::json!({}))))
}
