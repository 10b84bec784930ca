use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::{profiles::{self, ProfileId}, store, Error, Result};

use super::secret::{Secret, SecretScheme};

/// A credential as its owner sees it. The stored key never leaves the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credential {
    pub profile: ProfileId,
    pub username: Option<String>,
    pub name: String,
    pub authorized: bool,
    pub logged_in: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_auth: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    hash: String,
    profile: ProfileId,
    name: String,
    username: Option<String>,
    token: Option<String>,
    authorized: bool,
    created: i64,
    updated: i64,
    last_auth: i64,
}

impl TryFrom<CredentialRow> for Credential {
    type Error = Error;

    fn try_from(row: CredentialRow) -> Result<Self> {
        Ok(Credential {
            profile: row.profile,
            username: row.username,
            name: row.name,
            authorized: row.authorized,
            logged_in: row.token.is_some(),
            created: store::from_unix(row.created)?,
            updated: store::from_unix(row.updated)?,
            last_auth: store::from_unix(row.last_auth)?,
        })
    }
}

const COLUMNS: &str = "hash,profile,name,username,token,authorized,created,updated,last_auth";

/// Identity/credential mapping, secret verification and session tokens.
#[derive(Clone)]
pub struct CredentialStore {
    db_pool: SqlitePool,
    scheme: SecretScheme,
}

impl CredentialStore {
    pub fn new(db_pool: SqlitePool, scheme: SecretScheme) -> Self {
        Self { db_pool, scheme }
    }

    /// Finds the credential a secret refers to, without verifying it.
    async fn lookup(&self, conn: &mut SqliteConnection, secret: &Secret) -> Result<Option<CredentialRow>> {
        let row: Option<CredentialRow> = match secret {
            Secret::Named { username, .. } => {
                sqlx::query_as(&format!("SELECT {COLUMNS} FROM auth WHERE username=?"))
                    .bind(username)
                    .fetch_optional(&mut *conn)
                    .await?
            }
            Secret::Anonymous { device } => {
                sqlx::query_as(&format!("SELECT {COLUMNS} FROM auth WHERE hash=?"))
                    .bind(self.scheme.device_key(device))
                    .fetch_optional(&mut *conn)
                    .await?
            }
        };
        Ok(row)
    }

    /// Finds the credential and checks the secret against it.
    async fn verified(&self, conn: &mut SqliteConnection, secret: &Secret) -> Result<Option<CredentialRow>> {
        let Some(row) = self.lookup(conn, secret).await? else {
            return Ok(None);
        };
        let matches = match secret {
            Secret::Named { password, .. } => self.scheme.verify_password(&row.hash, password),
            // found by its digest, which is the check
            Secret::Anonymous { .. } => true,
        };
        Ok(matches.then_some(row))
    }

    async fn insert(
        &self,
        conn: &mut SqliteConnection,
        profile: ProfileId,
        secret: &Secret,
        name: &str,
        authorized: bool,
    ) -> Result<String> {
        let now = store::now().unix_timestamp();
        let token = store::token();
        sqlx::query(
            "INSERT INTO auth (hash,profile,name,username,token,authorized,created,updated,last_auth) VALUES (?,?,?,?,?,?,?,?,?)",
        )
        .bind(self.scheme.stored_key(secret)?)
        .bind(profile)
        .bind(name)
        .bind(secret.username())
        .bind(&token)
        .bind(authorized)
        .bind(now)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?;
        Ok(token)
    }

    /// Creates a new identity holding one credential, already logged in.
    pub async fn register(&self, secret: &Secret, name: &str) -> Result<(ProfileId, String)> {
        let mut tx = self.db_pool.begin().await?;
        if self.lookup(&mut tx, secret).await?.is_some() {
            return Err(Error::Conflict("auth exists".to_owned()));
        }

        let profile = profiles::insert(&mut tx).await?;
        let token = self.insert(&mut tx, profile, secret, name, true).await?;
        tx.commit().await?;

        info!(profile = %profile, username = ?secret.username(), "registered");
        Ok((profile, token))
    }

    /// Verifies the secret and issues a fresh token, replacing any previous one.
    pub async fn login(&self, secret: &Secret) -> Result<String> {
        let mut conn = self.db_pool.acquire().await?;
        let row = match self.verified(&mut conn, secret).await? {
            Some(row) if row.authorized => row,
            _ => {
                debug!(username = ?secret.username(), "login failure");
                return Err(Error::Unauthorized);
            }
        };

        let now = store::now().unix_timestamp();
        let token = store::token();
        let updated = sqlx::query("UPDATE auth SET token=?,last_auth=?,updated=? WHERE hash=?")
            .bind(&token)
            .bind(now)
            .bind(now)
            .bind(&row.hash)
            .execute(&mut *conn)
            .await?;
        if updated.rows_affected() != 1 {
            return Err(Error::Internal(anyhow::anyhow!(
                "login updated {} auth rows",
                updated.rows_affected()
            )));
        }

        info!(profile = %row.profile, "logged in");
        Ok(token)
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        if token.is_empty() {
            return Err(Error::Unauthorized);
        }
        let updated = sqlx::query("UPDATE auth SET token=NULL,updated=? WHERE token=?")
            .bind(store::now().unix_timestamp())
            .bind(token)
            .execute(&self.db_pool)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(Error::Unauthorized);
        }
        Ok(())
    }

    /// Resolves a session token to the identity holding it.
    pub async fn authenticate(&self, token: &str) -> Result<ProfileId> {
        if token.is_empty() {
            return Err(Error::Unauthorized);
        }
        let found: Option<(ProfileId, bool)> =
            sqlx::query_as("SELECT profile,authorized FROM auth WHERE token=?")
                .bind(token)
                .fetch_optional(&self.db_pool)
                .await?;
        match found {
            Some((profile, true)) => Ok(profile),
            _ => Err(Error::Unauthorized),
        }
    }

    pub async fn list(&self, profile: ProfileId) -> Result<Vec<Credential>> {
        sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {COLUMNS} FROM auth WHERE profile=? ORDER BY created,rowid"
        ))
        .bind(profile)
        .fetch_all(&self.db_pool)
        .await?
        .into_iter()
        .map(Credential::try_from)
        .collect()
    }

    /// Attaches a credential to `actor`, or updates one it already holds.
    ///
    /// A named credential held by someone else is off limits. An anonymous
    /// one is a device changing hands and is taken over.
    pub async fn add_or_update(
        &self,
        actor: ProfileId,
        secret: &Secret,
        name: &str,
        authorized: bool,
    ) -> Result<Vec<Credential>> {
        let mut tx = self.db_pool.begin().await?;
        match self.lookup(&mut tx, secret).await? {
            None => {
                self.insert(&mut tx, actor, secret, name, authorized).await?;
                info!(profile = %actor, username = ?secret.username(), "added auth");
            }
            Some(row) if row.profile != actor && row.username.is_some() => {
                return Err(Error::forbidden("credential belongs to another profile"));
            }
            Some(row) => {
                let hash = match secret {
                    Secret::Named { password, .. } => self.scheme.hash_password(password)?,
                    Secret::Anonymous { .. } => row.hash.clone(),
                };
                sqlx::query("UPDATE auth SET hash=?,name=?,authorized=?,profile=?,updated=? WHERE hash=?")
                    .bind(&hash)
                    .bind(name)
                    .bind(authorized)
                    .bind(actor)
                    .bind(store::now().unix_timestamp())
                    .bind(&row.hash)
                    .execute(&mut *tx)
                    .await?;
                if row.profile != actor {
                    info!(from = %row.profile, to = %actor, "device auth changed hands");
                }
            }
        }
        tx.commit().await?;
        self.list(actor).await
    }
}
