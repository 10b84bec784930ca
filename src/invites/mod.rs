mod engine;
mod invite;
mod msg;
mod new;
mod view;

use std::{fmt, str::FromStr};

use axum::{routing::{get, post}, Router};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{profiles::{PhotoId, Profile, ProfileId}, AppState, Error};

pub use engine::InvitationEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct InviteId(pub i64);

impl fmt::Display for InviteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct MessageId(pub i64);

/// An attendee's answer. Accepted and Declined are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Pending,
    Accepted,
    Declined,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Pending, Status::Accepted, Status::Declined];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Accepted => "Accepted",
            Status::Declined => "Declined",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<_> = Status::ALL.iter().map(|s| s.as_str()).collect();
                Error::validation(format!(
                    "'{s}' doesn't appear to be a valid status: {}",
                    valid.join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attendee {
    #[serde(flatten)]
    pub profile: Profile,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: MessageId,
    #[serde(with = "time::serde::rfc3339")]
    pub sent: OffsetDateTime,
    pub author: Profile,
    pub photo: Option<PhotoId>,
    pub body: String,
}

/// A proposed shoot: organizer, time, place, who is invited and what has
/// been said about it. Always assembled fresh from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invite {
    pub id: InviteId,
    pub organizer: ProfileId,
    pub active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    pub place: String,
    pub attendees: Vec<Attendee>,
    pub messages: Vec<Message>,
}

impl Invite {
    pub fn status_of(&self, profile: ProfileId) -> Option<Status> {
        self.attendees
            .iter()
            .find(|a| a.profile.id == profile)
            .map(|a| a.status)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    #[serde(default)]
    pub photo: Option<PhotoId>,
    pub body: String,
}

impl NewMessage {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            photo: None,
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInvite {
    pub attendees: Vec<ProfileId>,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end: Option<OffsetDateTime>,
    pub place: String,
    #[serde(default)]
    pub message: Option<NewMessage>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/invites", post(new::new_invite))
        .route("/invites/{id}", get(invite::invite).delete(invite::cancel_invite))
        .route("/invites/{id}/attendees", post(invite::add_attendees))
        .route("/invites/{id}/messages", post(msg::add_message))
        .route("/profiles/self/invites", get(invite::my_invites))
        .route("/profiles/self/invites/{id}/status", post(invite::change_status))
}
