//! Builds the `Invite` aggregate from its rows.

use std::collections::HashMap;

use sqlx::SqliteConnection;

use crate::{profiles::{self, PhotoId, Profile, ProfileId}, store, Error, Result};

use super::{Attendee, Invite, InviteId, Message, MessageId, Status};

#[derive(sqlx::FromRow)]
pub(crate) struct InviteRow {
    pub(crate) id: InviteId,
    pub(crate) organizer: ProfileId,
    pub(crate) active: bool,
    pub(crate) invitestart: i64,
    pub(crate) inviteend: Option<i64>,
    pub(crate) created: i64,
    pub(crate) place: String,
}

#[derive(sqlx::FromRow)]
struct AttendeeRow {
    profile: ProfileId,
    status: String,
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: MessageId,
    sent: i64,
    sender: ProfileId,
    photo: Option<PhotoId>,
    body: String,
}

pub(crate) async fn invite_row(conn: &mut SqliteConnection, id: InviteId) -> Result<InviteRow> {
    sqlx::query_as("SELECT id,organizer,active,invitestart,inviteend,created,place FROM invite WHERE id=?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::not_found(format!("invite {id}")))
}

/// Profiles referenced by one invite, each loaded at most once.
struct ProfileCache(HashMap<ProfileId, Profile>);

impl ProfileCache {
    async fn get(&mut self, conn: &mut SqliteConnection, id: ProfileId) -> Result<Profile> {
        if let Some(profile) = self.0.get(&id) {
            return Ok(profile.clone());
        }
        let profile = profiles::fetch(conn, id)
            .await?
            .ok_or_else(|| Error::Internal(anyhow::anyhow!("invite refers to missing profile {id}")))?;
        self.0.insert(id, profile.clone());
        Ok(profile)
    }
}

/// Reads the invite, its attendees in the order they were added and its
/// messages in id order.
pub(crate) async fn assemble(conn: &mut SqliteConnection, id: InviteId) -> Result<Invite> {
    let row = invite_row(conn, id).await?;

    let attendee_rows: Vec<AttendeeRow> =
        sqlx::query_as("SELECT profile,status FROM profile_invite WHERE invite=? ORDER BY rowid")
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;

    let message_rows: Vec<MessageRow> =
        sqlx::query_as("SELECT id,sent,sender,photo,body FROM message WHERE invite=? ORDER BY id ASC")
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;

    let mut cache = ProfileCache(HashMap::new());

    let mut attendees = Vec::with_capacity(attendee_rows.len());
    for AttendeeRow { profile, status } in attendee_rows {
        attendees.push(Attendee {
            profile: cache.get(conn, profile).await?,
            status: status.parse::<Status>().map_err(|e| Error::Internal(e.into()))?,
        });
    }

    let mut messages = Vec::with_capacity(message_rows.len());
    for m in message_rows {
        messages.push(Message {
            id: m.id,
            sent: store::from_unix(m.sent)?,
            author: cache.get(conn, m.sender).await?,
            photo: m.photo,
            body: m.body,
        });
    }

    Ok(Invite {
        id: row.id,
        organizer: row.organizer,
        active: row.active,
        start: store::from_unix(row.invitestart)?,
        end: store::from_unix_opt(row.inviteend)?,
        created: store::from_unix(row.created)?,
        place: row.place,
        attendees,
        messages,
    })
}
