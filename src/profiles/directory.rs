use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::{store, Error, Result};

use super::{Flag, Profile, ProfileId, Profiles, Utype};

/// Utype given to every new profile until it says otherwise.
const DEFAULT_UTYPE: i64 = 1;

/// Replacement contact fields and tag sets for a profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileChange {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub utypes: Vec<i64>,
    #[serde(default)]
    pub flags: Vec<i64>,
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: ProfileId,
    created: i64,
    updated: i64,
    email: Option<String>,
    phone: Option<String>,
    name: Option<String>,
    folder: String,
}

/// Creates a bare profile carrying the default utype.
pub(crate) async fn insert(conn: &mut SqliteConnection) -> Result<ProfileId> {
    let now = store::now().unix_timestamp();
    let folder = Uuid::now_v7().simple().to_string();

    let (id,): (ProfileId,) =
        sqlx::query_as("INSERT INTO profile (created,updated,folder) VALUES (?,?,?) RETURNING id")
            .bind(now)
            .bind(now)
            .bind(&folder)
            .fetch_one(&mut *conn)
            .await?;

    sqlx::query("INSERT INTO profile_utype (utype,profile) VALUES (?,?)")
        .bind(DEFAULT_UTYPE)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    info!(profile = %id, "adding profile");
    Ok(id)
}

pub(crate) async fn exists(conn: &mut SqliteConnection, id: ProfileId) -> Result<bool> {
    Ok(sqlx::query("SELECT 1 FROM profile WHERE id=?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .is_some())
}

/// Loads a profile together with its utypes and flags.
pub(crate) async fn fetch(conn: &mut SqliteConnection, id: ProfileId) -> Result<Option<Profile>> {
    let Some(row) = sqlx::query_as::<_, ProfileRow>(
        "SELECT id,created,updated,email,phone,name,folder FROM profile WHERE id=?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    else {
        return Ok(None);
    };

    let utypes: Vec<Utype> = sqlx::query_as(
        "SELECT utype.id,utype.name FROM utype INNER JOIN profile_utype ON (utype=id) WHERE profile=? ORDER BY utype.id",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let flags: Vec<Flag> = sqlx::query_as(
        "SELECT flag.id,flag.name FROM flag INNER JOIN profile_flag ON (flag=id) WHERE profile=? ORDER BY flag.id",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(Profile {
        id: row.id,
        created: store::from_unix(row.created)?,
        updated: store::from_unix(row.updated)?,
        email: row.email,
        phone: row.phone,
        name: row.name,
        folder: row.folder,
        utypes,
        flags,
    }))
}

impl Profiles {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }

    pub async fn create(&self) -> Result<ProfileId> {
        let mut tx = self.db_pool.begin().await?;
        let id = insert(&mut tx).await?;
        tx.commit().await?;
        Ok(id)
    }

    pub async fn get(&self, id: ProfileId) -> Result<Profile> {
        let mut conn = self.db_pool.acquire().await?;
        fetch(&mut conn, id)
            .await?
            .ok_or_else(|| Error::not_found(format!("profile {id}")))
    }

    /// Replaces contact fields and both tag sets. A profile must keep at
    /// least one utype.
    pub async fn update(&self, id: ProfileId, change: ProfileChange) -> Result<Profile> {
        if change.utypes.is_empty() {
            return Err(Error::validation("profile utype cannot be empty"));
        }

        let mut tx = self.db_pool.begin().await?;
        for utype in &change.utypes {
            if sqlx::query("SELECT 1 FROM utype WHERE id=?")
                .bind(utype)
                .fetch_optional(&mut *tx)
                .await?
                .is_none()
            {
                return Err(Error::validation(format!("'{utype}' is not a profile type")));
            }
        }
        for flag in &change.flags {
            if sqlx::query("SELECT 1 FROM flag WHERE id=?")
                .bind(flag)
                .fetch_optional(&mut *tx)
                .await?
                .is_none()
            {
                return Err(Error::validation(format!("'{flag}' is not a flag")));
            }
        }

        let updated = sqlx::query("UPDATE profile SET email=?,phone=?,name=?,updated=? WHERE id=?")
            .bind(&change.email)
            .bind(&change.phone)
            .bind(&change.name)
            .bind(store::now().unix_timestamp())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() != 1 {
            return Err(Error::not_found(format!("profile {id}")));
        }

        sqlx::query("DELETE FROM profile_flag WHERE profile=?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for flag in &change.flags {
            sqlx::query("INSERT OR IGNORE INTO profile_flag (flag,profile) VALUES (?,?)")
                .bind(flag)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM profile_utype WHERE profile=?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for utype in &change.utypes {
            sqlx::query("INSERT OR IGNORE INTO profile_utype (utype,profile) VALUES (?,?)")
                .bind(utype)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let profile = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| Error::not_found(format!("profile {id}")))?;
        tx.commit().await?;
        Ok(profile)
    }

    pub async fn utypes(&self) -> Result<Vec<Utype>> {
        Ok(sqlx::query_as("SELECT id,name FROM utype ORDER BY id ASC")
            .fetch_all(&self.db_pool)
            .await?)
    }

    pub async fn flags(&self) -> Result<Vec<Flag>> {
        Ok(sqlx::query_as("SELECT id,name FROM flag ORDER BY id ASC")
            .fetch_all(&self.db_pool)
            .await?)
    }
}
