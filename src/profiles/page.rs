use axum::{debug_handler, extract::{Path, State}, http::StatusCode, Json};
use serde::Deserialize;

use crate::{auth::Actor, AppResult};

use super::{Flag, Photo, PhotoId, Profile, ProfileChange, ProfileId, Profiles, Utype};

#[derive(Deserialize)]
pub(crate) struct NewPhoto {
    #[serde(default)]
    caption: String,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn own_profile(
    actor: Actor,
    State(profiles): State<Profiles>,
) -> AppResult<Json<Profile>> {
    Ok(Json(profiles.get(actor.profile).await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn profile(
    _actor: Actor,
    Path(id): Path<ProfileId>,
    State(profiles): State<Profiles>,
) -> AppResult<Json<Profile>> {
    Ok(Json(profiles.get(id).await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn update_profile(
    actor: Actor,
    State(profiles): State<Profiles>,
    Json(change): Json<ProfileChange>,
) -> AppResult<Json<Profile>> {
    Ok(Json(profiles.update(actor.profile, change).await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn photos(
    actor: Actor,
    State(profiles): State<Profiles>,
) -> AppResult<Json<Vec<Photo>>> {
    Ok(Json(profiles.photos(actor.profile).await?))
}

/// Records the photo and hands back the href the bytes are to be stored under.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn add_photo(
    actor: Actor,
    State(profiles): State<Profiles>,
    Json(NewPhoto { caption }): Json<NewPhoto>,
) -> AppResult<(StatusCode, Json<Photo>)> {
    let photo = profiles.add_photo(actor.profile, &caption).await?;
    Ok((StatusCode::CREATED, Json(photo)))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn photo(
    actor: Actor,
    Path(id): Path<PhotoId>,
    State(profiles): State<Profiles>,
) -> AppResult<Json<Photo>> {
    Ok(Json(profiles.photo(actor.profile, id).await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn remove_photo(
    actor: Actor,
    Path(id): Path<PhotoId>,
    State(profiles): State<Profiles>,
) -> AppResult<StatusCode> {
    profiles.remove_photo(actor.profile, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn flags(State(profiles): State<Profiles>) -> AppResult<Json<Vec<Flag>>> {
    Ok(Json(profiles.flags().await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn utypes(State(profiles): State<Profiles>) -> AppResult<Json<Vec<Utype>>> {
    Ok(Json(profiles.utypes().await?))
}
