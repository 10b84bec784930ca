use axum::{debug_handler, extract::State, http::StatusCode, Json};

use crate::{auth::Actor, AppResult};

use super::{InvitationEngine, Invite, NewInvite};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn new_invite(
    actor: Actor,
    State(engine): State<InvitationEngine>,
    Json(new): Json<NewInvite>,
) -> AppResult<(StatusCode, Json<Invite>)> {
    let invite = engine.create(actor.profile, new).await?;
    Ok((StatusCode::CREATED, Json(invite)))
}
