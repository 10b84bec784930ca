mod directory;
mod page;
mod photos;

use axum::{routing::get, Router};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::AppState;

pub use directory::ProfileChange;
pub(crate) use directory::{exists, fetch, insert};
pub use photos::{Photo, PhotoId};
pub(crate) use photos::find_owned;

/// Identity root. Credentials, freetimes and invites all hang off this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ProfileId(pub i64);

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Profile type, e.g. "Model". Profiles may carry several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Utype {
    pub id: i64,
    pub name: String,
}

/// Search flag such as "Travels".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Flag {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub id: ProfileId,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated: OffsetDateTime,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
    /// Blob-store folder holding this profile's photos.
    #[serde(skip)]
    pub folder: String,
    pub utypes: Vec<Utype>,
    pub flags: Vec<Flag>,
}

impl Profile {
    pub fn has_flag(&self, flag: i64) -> bool {
        self.flags.iter().any(|f| f.id == flag)
    }

    pub fn has_utype(&self, utype: i64) -> bool {
        self.utypes.iter().any(|t| t.id == utype)
    }
}

/// Handle over the profile tables.
#[derive(Clone)]
pub struct Profiles {
    db_pool: SqlitePool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profiles/self", get(page::own_profile).put(page::update_profile))
        .route("/profiles/{id}", get(page::profile))
        .route("/profiles/self/photos", get(page::photos).post(page::add_photo))
        .route("/profiles/self/photos/{id}", get(page::photo).delete(page::remove_photo))
        .route("/flags", get(page::flags))
        .route("/types", get(page::utypes))
}
