use axum::{debug_handler, extract::{Path, Query, State}, Json};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{auth::Actor, frees, profiles::ProfileId, AppResult};

use super::{InvitationEngine, Invite, InviteId, Status};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn invite(
    _actor: Actor,
    Path(id): Path<InviteId>,
    State(engine): State<InvitationEngine>,
) -> AppResult<Json<Invite>> {
    Ok(Json(engine.get(id).await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn cancel_invite(
    actor: Actor,
    Path(id): Path<InviteId>,
    State(engine): State<InvitationEngine>,
) -> AppResult<Json<Invite>> {
    Ok(Json(engine.cancel(id, actor.profile).await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn add_attendees(
    actor: Actor,
    Path(id): Path<InviteId>,
    State(engine): State<InvitationEngine>,
    Json(ids): Json<Vec<ProfileId>>,
) -> AppResult<Json<Invite>> {
    Ok(Json(engine.add_attendees(id, actor.profile, &ids).await?))
}

/// Body is the bare status string, e.g. `"Accepted"`.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn change_status(
    actor: Actor,
    Path(id): Path<InviteId>,
    State(engine): State<InvitationEngine>,
    Json(status): Json<String>,
) -> AppResult<Json<Invite>> {
    let status: Status = status.parse()?;
    Ok(Json(engine.change_status(id, actor.profile, status).await?))
}

#[derive(Deserialize)]
pub(crate) struct InviteSearch {
    status: Option<String>,
    from: Option<String>,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn my_invites(
    actor: Actor,
    State(engine): State<InvitationEngine>,
    Query(InviteSearch { status, from }): Query<InviteSearch>,
) -> AppResult<Json<Vec<Invite>>> {
    let status = status.map(|s| s.parse::<Status>()).transpose()?;
    let from = match from {
        Some(from) => frees::parse_time(&from)?,
        None => OffsetDateTime::now_utc(),
    };
    Ok(Json(engine.list(actor.profile, status, from).await?))
}
