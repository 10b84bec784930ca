use axum::{debug_handler, extract::{Path, Query, State}, http::StatusCode, Json};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{auth::Actor, profiles::{Profile, ProfileId, Profiles}, AppResult, Error};

use super::{AvailabilityIndex, Freetime};

pub(crate) fn parse_time(raw: &str) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::parse(raw, &Rfc3339)
        .map_err(|_| Error::validation(format!("didn't understand '{raw}' as a time")))
}

fn parse_id(raw: &str, what: &str) -> Result<i64, Error> {
    raw.parse()
        .map_err(|_| Error::validation(format!("didn't understand '{raw}' as a {what}")))
}

/// `?from=<rfc3339>&type=<id>&flag=<id>`, with `type` and `flag` repeatable.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn search(
    _actor: Actor,
    State(index): State<AvailabilityIndex>,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<Json<Vec<Profile>>> {
    let mut at = OffsetDateTime::now_utc();
    let mut utypes = Vec::new();
    let mut flags = Vec::new();
    for (key, value) in &params {
        match key.as_str() {
            "from" => at = parse_time(value)?,
            "type" => utypes.push(parse_id(value, "profile type")?),
            "flag" => flags.push(parse_id(value, "flag")?),
            _ => {}
        }
    }

    Ok(Json(index.search_available(at, &utypes, &flags).await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn own_frees(
    actor: Actor,
    State(index): State<AvailabilityIndex>,
) -> AppResult<Json<Vec<Freetime>>> {
    Ok(Json(index.list_upcoming(actor.profile).await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn frees(
    _actor: Actor,
    Path(id): Path<ProfileId>,
    State(index): State<AvailabilityIndex>,
    State(profiles): State<Profiles>,
) -> AppResult<Json<Vec<Freetime>>> {
    let profile = profiles.get(id).await?;
    Ok(Json(index.list_upcoming(profile.id).await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn create_frees(
    actor: Actor,
    State(index): State<AvailabilityIndex>,
    Json(frees): Json<Vec<Freetime>>,
) -> AppResult<Json<Vec<Freetime>>> {
    Ok(Json(index.new_intervals(actor.profile, &frees).await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn update_free(
    actor: Actor,
    State(index): State<AvailabilityIndex>,
    Json(free): Json<Freetime>,
) -> AppResult<Json<Vec<Freetime>>> {
    index.update_interval(actor.profile, free.start, free.end).await?;
    Ok(Json(index.list_upcoming(actor.profile).await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn remove_free(
    actor: Actor,
    Path(start): Path<String>,
    State(index): State<AvailabilityIndex>,
) -> AppResult<StatusCode> {
    index.remove_interval(actor.profile, parse_time(&start)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn remove_all_frees(
    actor: Actor,
    State(index): State<AvailabilityIndex>,
) -> AppResult<StatusCode> {
    index.remove_all(actor.profile).await?;
    Ok(StatusCode::NO_CONTENT)
}
