use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{appresult::AppError, profiles::ProfileId};

use super::CredentialStore;

pub const TOKEN_HEADER: &str = "x-chute-token";

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Actor {
    pub profile: ProfileId,
    pub token: String,
}

impl<S> FromRequestParts<S> for Actor
where
    CredentialStore: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();

        let profile = CredentialStore::from_ref(state).authenticate(&token).await?;
        Ok(Actor { profile, token })
    }
}
