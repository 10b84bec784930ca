use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use time::OffsetDateTime;
use tracing::info;

use crate::{store, Error, Result};

use super::{ProfileId, Profiles};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct PhotoId(pub i64);

/// Bookkeeping for an uploaded photo. The bytes live in the blob store under
/// the owner's folder, keyed by `href`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Photo {
    pub id: PhotoId,
    pub profile: ProfileId,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    pub href: String,
    pub caption: String,
}

#[derive(sqlx::FromRow)]
struct PhotoRow {
    id: PhotoId,
    profile: ProfileId,
    created: i64,
    href: String,
    caption: String,
}

impl TryFrom<PhotoRow> for Photo {
    type Error = Error;

    fn try_from(row: PhotoRow) -> Result<Self> {
        Ok(Photo {
            id: row.id,
            profile: row.profile,
            created: store::from_unix(row.created)?,
            href: row.href,
            caption: row.caption,
        })
    }
}

/// Ownership check: the photo exists and belongs to `owner`.
pub(crate) async fn find_owned(
    conn: &mut SqliteConnection,
    id: PhotoId,
    owner: ProfileId,
) -> Result<Option<Photo>> {
    sqlx::query_as::<_, PhotoRow>("SELECT id,profile,created,href,caption FROM photo WHERE id=? AND profile=?")
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *conn)
        .await?
        .map(Photo::try_from)
        .transpose()
}

impl Profiles {
    /// Records a photo row with a fresh href. Storing the bytes under that
    /// href is up to the blob store.
    pub async fn add_photo(&self, owner: ProfileId, caption: &str) -> Result<Photo> {
        let row: PhotoRow = sqlx::query_as(
            "INSERT INTO photo (profile,created,href,caption) VALUES (?,?,?,?) RETURNING id,profile,created,href,caption",
        )
        .bind(owner)
        .bind(store::now().unix_timestamp())
        .bind(store::token())
        .bind(caption)
        .fetch_one(&self.db_pool)
        .await?;
        row.try_into()
    }

    pub async fn photo(&self, owner: ProfileId, id: PhotoId) -> Result<Photo> {
        let mut conn = self.db_pool.acquire().await?;
        find_owned(&mut conn, id, owner)
            .await?
            .ok_or_else(|| Error::not_found("photo"))
    }

    pub async fn photos(&self, owner: ProfileId) -> Result<Vec<Photo>> {
        sqlx::query_as::<_, PhotoRow>("SELECT id,profile,created,href,caption FROM photo WHERE profile=? ORDER BY id")
            .bind(owner)
            .fetch_all(&self.db_pool)
            .await?
            .into_iter()
            .map(Photo::try_from)
            .collect()
    }

    /// Deletes the row after detaching it from any message that shows it.
    pub async fn remove_photo(&self, owner: ProfileId, id: PhotoId) -> Result<()> {
        let mut tx = self.db_pool.begin().await?;
        if find_owned(&mut tx, id, owner).await?.is_none() {
            return Err(Error::not_found("photo"));
        }

        sqlx::query("UPDATE message SET photo=NULL WHERE photo=?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM photo WHERE id=?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(photo = id.0, profile = %owner, "removed photo");
        Ok(())
    }
}
