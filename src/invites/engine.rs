use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{profiles::{self, ProfileId}, store, Error, Result};

use super::{
    msg::{check_photo, insert_message},
    view::{assemble, invite_row},
    Invite, InviteId, NewInvite, NewMessage, Status,
};

/// Owns the invite aggregate: attendees, their answers and the messages.
#[derive(Clone)]
pub struct InvitationEngine {
    db_pool: SqlitePool,
}

/// Duplicates and the organizer's own id are dropped; first mention wins.
fn attendee_set(organizer: ProfileId, ids: &[ProfileId]) -> Vec<ProfileId> {
    let mut out: Vec<ProfileId> = Vec::with_capacity(ids.len());
    for &id in ids {
        if id != organizer && !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

impl InvitationEngine {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }

    pub async fn get(&self, id: InviteId) -> Result<Invite> {
        let mut conn = self.db_pool.acquire().await?;
        assemble(&mut conn, id).await
    }

    /// Inserts the invite, its pending attendees and the optional first
    /// message in one transaction.
    pub async fn create(&self, organizer: ProfileId, new: NewInvite) -> Result<Invite> {
        let start = store::truncate(new.start);
        let end = new.end.map(store::truncate);
        if let Some(end) = end {
            if end <= start {
                return Err(Error::validation(format!("{end} is not after {start}")));
            }
        }
        if new.attendees.is_empty() {
            return Err(Error::validation("There must be at least one attendee for an invite."));
        }
        let attendees = attendee_set(organizer, &new.attendees);
        if attendees.is_empty() {
            return Err(Error::validation("The organizer cannot be the only attendee."));
        }

        let mut tx = self.db_pool.begin().await?;
        for &attendee in &attendees {
            if !profiles::exists(&mut tx, attendee).await? {
                return Err(Error::not_found(format!("profile {attendee}")));
            }
        }
        if let Some(message) = &new.message {
            check_photo(&mut tx, organizer, message).await?;
        }

        let (id,): (InviteId,) = sqlx::query_as(
            "INSERT INTO invite (organizer,active,invitestart,inviteend,created,place) VALUES (?,1,?,?,?,?) RETURNING id",
        )
        .bind(organizer)
        .bind(start.unix_timestamp())
        .bind(end.map(OffsetDateTime::unix_timestamp))
        .bind(store::now().unix_timestamp())
        .bind(&new.place)
        .fetch_one(&mut *tx)
        .await?;

        for &attendee in &attendees {
            sqlx::query("INSERT INTO profile_invite (profile,invite,status) VALUES (?,?,?)")
                .bind(attendee)
                .bind(id)
                .bind(Status::Pending.as_str())
                .execute(&mut *tx)
                .await?;
        }

        if let Some(message) = &new.message {
            insert_message(&mut tx, id, organizer, message).await?;
        }
        tx.commit().await?;

        info!(invite = %id, organizer = %organizer, attendees = attendees.len(), "created invite");
        self.get(id).await
    }

    /// Deactivates the invite. Cancelling twice is fine.
    pub async fn cancel(&self, id: InviteId, actor: ProfileId) -> Result<Invite> {
        let mut conn = self.db_pool.acquire().await?;
        let row = invite_row(&mut conn, id).await?;
        if row.organizer != actor {
            return Err(Error::forbidden("You are not the Organizer for this Invite."));
        }

        sqlx::query("UPDATE invite SET active=0 WHERE id=?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        if row.active {
            info!(invite = %id, "cancelled invite");
        }
        assemble(&mut conn, id).await
    }

    /// Records `actor`'s own answer.
    ///
    /// An actor who isn't an attendee matches no row and gets the invite
    /// back unchanged rather than an error.
    pub async fn change_status(&self, id: InviteId, actor: ProfileId, status: Status) -> Result<Invite> {
        if status == Status::Pending {
            return Err(Error::validation("an answer cannot go back to Pending"));
        }

        let mut conn = self.db_pool.acquire().await?;
        invite_row(&mut conn, id).await?;

        let updated = sqlx::query(
            "UPDATE profile_invite SET status=? WHERE invite=? AND profile=? AND status=?",
        )
        .bind(status.as_str())
        .bind(id)
        .bind(actor)
        .bind(Status::Pending.as_str())
        .execute(&mut *conn)
        .await?;

        if updated.rows_affected() == 0 {
            let current: Option<(String,)> =
                sqlx::query_as("SELECT status FROM profile_invite WHERE invite=? AND profile=?")
                    .bind(id)
                    .bind(actor)
                    .fetch_optional(&mut *conn)
                    .await?;
            match current {
                None => {
                    // TODO: decide between Forbidden and NotFound for non-attendees
                    warn!(invite = %id, profile = %actor, "status change from a non-attendee ignored");
                }
                Some((current,)) if current == status.as_str() => {}
                Some((current,)) => {
                    return Err(Error::Conflict(format!("attendee already {current}")));
                }
            }
        } else {
            info!(invite = %id, profile = %actor, %status, "attendee answered");
        }

        assemble(&mut conn, id).await
    }

    /// Set-union of new pending attendees into the invite. Only the
    /// organizer may do this; ids already present are skipped.
    pub async fn add_attendees(&self, id: InviteId, actor: ProfileId, ids: &[ProfileId]) -> Result<Invite> {
        let mut tx = self.db_pool.begin().await?;
        let row = invite_row(&mut tx, id).await?;
        if row.organizer != actor {
            return Err(Error::forbidden("You are not the Organizer for this Invite."));
        }

        let attendees = attendee_set(row.organizer, ids);
        for &attendee in &attendees {
            if !profiles::exists(&mut tx, attendee).await? {
                return Err(Error::validation(format!("'{attendee}' is not a valid Profile id.")));
            }
        }

        let mut added = 0;
        for &attendee in &attendees {
            added += sqlx::query(
                "INSERT INTO profile_invite (profile,invite,status) VALUES (?,?,?) ON CONFLICT (profile,invite) DO NOTHING",
            )
            .bind(attendee)
            .bind(id)
            .bind(Status::Pending.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }
        tx.commit().await?;

        if added > 0 {
            info!(invite = %id, added, "added attendees");
        }
        self.get(id).await
    }

    pub async fn add_message(&self, id: InviteId, author: ProfileId, message: NewMessage) -> Result<Invite> {
        let mut conn = self.db_pool.acquire().await?;
        invite_row(&mut conn, id).await?;
        check_photo(&mut conn, author, &message).await?;
        insert_message(&mut conn, id, author, &message).await?;
        assemble(&mut conn, id).await
    }

    /// Invites starting after the day of `from`, oldest first.
    ///
    /// Without a status these are the invites `profile` organizes; with one,
    /// the invites where `profile` is an attendee holding that status.
    pub async fn list(&self, profile: ProfileId, status: Option<Status>, from: OffsetDateTime) -> Result<Vec<Invite>> {
        let day = store::start_of_day(from).unix_timestamp();
        let mut conn = self.db_pool.acquire().await?;

        let ids: Vec<(InviteId,)> = match status {
            None => {
                sqlx::query_as(
                    "SELECT id FROM invite WHERE organizer=? AND invitestart>? ORDER BY created ASC, id ASC",
                )
                .bind(profile)
                .bind(day)
                .fetch_all(&mut *conn)
                .await?
            }
            Some(status) => {
                sqlx::query_as(
                    "SELECT invite.id FROM invite INNER JOIN profile_invite ON (invite.id=profile_invite.invite)
                     WHERE profile_invite.status=? AND profile_invite.profile=? AND invite.invitestart>?
                     ORDER BY invite.created ASC, invite.id ASC",
                )
                .bind(status.as_str())
                .bind(profile)
                .bind(day)
                .fetch_all(&mut *conn)
                .await?
            }
        };

        let mut invites = Vec::with_capacity(ids.len());
        for (id,) in ids {
            invites.push(assemble(&mut conn, id).await?);
        }
        Ok(invites)
    }
}
