use axum::{debug_handler, extract::{Path, State}, Json};
use sqlx::SqliteConnection;

use crate::{auth::Actor, profiles::{self, ProfileId}, store, AppResult, Error, Result};

use super::{InvitationEngine, Invite, InviteId, MessageId, NewMessage};

/// Rejects a photo the author doesn't own.
pub(crate) async fn check_photo(conn: &mut SqliteConnection, author: ProfileId, message: &NewMessage) -> Result<()> {
    let Some(photo) = message.photo else {
        return Ok(());
    };
    if profiles::find_owned(conn, photo, author).await?.is_none() {
        return Err(Error::validation(format!("'{}' is not a valid Photo Id.", photo.0)));
    }
    Ok(())
}

/// Appends a message; the store assigns the id and the server the timestamp.
pub(crate) async fn insert_message(
    conn: &mut SqliteConnection,
    invite: InviteId,
    author: ProfileId,
    message: &NewMessage,
) -> Result<MessageId> {
    let (id,): (MessageId,) =
        sqlx::query_as("INSERT INTO message (sent,sender,invite,photo,body) VALUES (?,?,?,?,?) RETURNING id")
            .bind(store::now().unix_timestamp())
            .bind(author)
            .bind(invite)
            .bind(message.photo)
            .bind(&message.body)
            .fetch_one(&mut *conn)
            .await?;
    Ok(id)
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn add_message(
    actor: Actor,
    Path(id): Path<InviteId>,
    State(engine): State<InvitationEngine>,
    Json(message): Json<NewMessage>,
) -> AppResult<Json<Invite>> {
    Ok(Json(engine.add_message(id, actor.profile, message).await?))
}
