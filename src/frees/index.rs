use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use time::OffsetDateTime;
use tracing::debug;

use crate::{profiles::{self, Profile, ProfileId}, store, Error, Result};

/// A span during which a profile is available. Unique per (profile, start).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Freetime {
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
}

impl Freetime {
    /// Requires `end > start`. Both ends keep their full precision.
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self> {
        if end <= start {
            return Err(Error::validation(format!("{end} is not after {start}")));
        }
        Ok(Freetime { start, end })
    }
}

#[derive(sqlx::FromRow)]
struct FreetimeRow {
    freestart: i64,
    freeend: i64,
}

impl TryFrom<FreetimeRow> for Freetime {
    type Error = Error;

    fn try_from(row: FreetimeRow) -> Result<Self> {
        Ok(Freetime {
            start: store::from_nanos(row.freestart)?,
            end: store::from_nanos(row.freeend)?,
        })
    }
}

/// Insert, or move the end of the interval already starting at `start`.
async fn upsert(conn: &mut SqliteConnection, profile: ProfileId, free: Freetime) -> Result<()> {
    sqlx::query(
        "INSERT INTO free (profile,created,freestart,freeend) VALUES (?,?,?,?)
         ON CONFLICT (profile,freestart) DO UPDATE SET freeend=excluded.freeend",
    )
    .bind(profile)
    .bind(store::now().unix_timestamp())
    .bind(store::to_nanos(free.start)?)
    .bind(store::to_nanos(free.end)?)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Per-profile free time and the search over it.
#[derive(Clone)]
pub struct AvailabilityIndex {
    db_pool: SqlitePool,
}

impl AvailabilityIndex {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }

    /// Re-submitting an existing start updates its end instead of failing.
    pub async fn new_interval(&self, profile: ProfileId, start: OffsetDateTime, end: OffsetDateTime) -> Result<()> {
        let free = Freetime::new(start, end)?;
        let mut conn = self.db_pool.acquire().await?;
        upsert(&mut conn, profile, free).await
    }

    /// Validates the whole batch first, then applies it in one transaction.
    pub async fn new_intervals(&self, profile: ProfileId, frees: &[Freetime]) -> Result<Vec<Freetime>> {
        let frees = frees
            .iter()
            .map(|f| Freetime::new(f.start, f.end))
            .collect::<Result<Vec<_>>>()?;

        let mut tx = self.db_pool.begin().await?;
        for free in frees {
            upsert(&mut tx, profile, free).await?;
        }
        tx.commit().await?;

        self.list_upcoming(profile).await
    }

    pub async fn update_interval(&self, profile: ProfileId, start: OffsetDateTime, new_end: OffsetDateTime) -> Result<()> {
        let free = Freetime::new(start, new_end)?;
        let updated = sqlx::query("UPDATE free SET freeend=? WHERE profile=? AND freestart=?")
            .bind(store::to_nanos(free.end)?)
            .bind(profile)
            .bind(store::to_nanos(free.start)?)
            .execute(&self.db_pool)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(Error::not_found(format!("freetime at {}", free.start)));
        }
        Ok(())
    }

    pub async fn remove_interval(&self, profile: ProfileId, start: OffsetDateTime) -> Result<()> {
        sqlx::query("DELETE FROM free WHERE profile=? AND freestart=?")
            .bind(profile)
            .bind(store::to_nanos(start)?)
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }

    /// Returns how many intervals were dropped.
    pub async fn remove_all(&self, profile: ProfileId) -> Result<u64> {
        let removed = sqlx::query("DELETE FROM free WHERE profile=?")
            .bind(profile)
            .execute(&self.db_pool)
            .await?;
        Ok(removed.rows_affected())
    }

    pub async fn list_upcoming(&self, profile: ProfileId) -> Result<Vec<Freetime>> {
        self.list_upcoming_from(profile, OffsetDateTime::now_utc()).await
    }

    /// Intervals starting after the day `now` falls on, earliest first.
    pub async fn list_upcoming_from(&self, profile: ProfileId, now: OffsetDateTime) -> Result<Vec<Freetime>> {
        sqlx::query_as::<_, FreetimeRow>(
            "SELECT freestart,freeend FROM free WHERE profile=? AND freestart>? ORDER BY freestart ASC",
        )
        .bind(profile)
        .bind(store::to_nanos(store::start_of_day(now))?)
        .fetch_all(&self.db_pool)
        .await?
        .into_iter()
        .map(Freetime::try_from)
        .collect()
    }

    /// Profiles free at `at`, i.e. holding an interval with `start < at < end`.
    ///
    /// `utypes` match if any one applies (or none were asked for); `flags`
    /// must all be present.
    pub async fn search_available(&self, at: OffsetDateTime, utypes: &[i64], flags: &[i64]) -> Result<Vec<Profile>> {
        let at = store::to_nanos(at)?;
        let mut query = QueryBuilder::<Sqlite>::new("SELECT DISTINCT free.profile FROM free WHERE free.freestart < ");
        query.push_bind(at).push(" AND ").push_bind(at).push(" < free.freeend");

        for flag in flags {
            query
                .push(" AND free.profile IN (SELECT profile FROM profile_flag WHERE flag = ")
                .push_bind(*flag)
                .push(")");
        }

        if !utypes.is_empty() {
            query.push(" AND free.profile IN (SELECT profile FROM profile_utype WHERE utype IN (");
            let mut ors = query.separated(", ");
            for utype in utypes {
                ors.push_bind(*utype);
            }
            ors.push_unseparated("))");
        }
        query.push(" ORDER BY free.profile");

        let mut conn = self.db_pool.acquire().await?;
        let ids: Vec<(ProfileId,)> = query.build_query_as().fetch_all(&mut *conn).await?;
        debug!(matches = ids.len(), "availability search");

        let mut found = Vec::with_capacity(ids.len());
        for (id,) in ids {
            if let Some(profile) = profiles::fetch(&mut conn, id).await? {
                found.push(profile);
            }
        }
        Ok(found)
    }
}
