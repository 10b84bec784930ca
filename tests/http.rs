mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chute::auth::TOKEN_HEADER;
use serde_json::{json, Value};
use time::macros::datetime;
use tower::ServiceExt;

struct Reply {
    status: StatusCode,
    token: Option<String>,
    body: Value,
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(TOKEN_HEADER, token);
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let token = response
        .headers()
        .get(TOKEN_HEADER)
        .map(|value| value.to_str().unwrap().to_owned());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    Reply { status, token, body }
}

/// Registers a device credential and returns (profile id, token).
async fn register(app: &Router, device: &str) -> (i64, String) {
    let reply = send(app, "POST", "/profiles/self", None, Some(json!({ "hash": device }))).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    (reply.body["id"].as_i64().unwrap(), reply.token.unwrap())
}

#[tokio::test]
async fn register_returns_a_working_token() {
    let app = chute::router(common::app().await);

    let reply = send(
        &app,
        "POST",
        "/profiles/self",
        None,
        Some(json!({ "hash": "pw", "username": "al", "name": "laptop" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    let first = reply.token.unwrap();
    assert_eq!(first.len(), 40);
    let id = reply.body["id"].as_i64().unwrap();

    let me = send(&app, "GET", "/profiles/self", Some(&first), None).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["id"].as_i64(), Some(id));
    assert_eq!(me.body["utypes"][0]["name"], "Model");

    let login = send(
        &app,
        "POST",
        "/actions/login",
        None,
        Some(json!({ "hash": "pw", "username": "al" })),
    )
    .await;
    assert_eq!(login.status, StatusCode::OK);
    let second = login.token.unwrap();
    assert_ne!(second, first);

    let stale = send(&app, "GET", "/profiles/self", Some(&first), None).await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);
    let auths = send(&app, "GET", "/profiles/self/auths", Some(&second), None).await;
    assert_eq!(auths.status, StatusCode::OK);
    assert_eq!(auths.body[0]["username"], "al");
    assert!(auths.body[0].get("hash").is_none());

    let logout = send(&app, "POST", "/actions/logout", Some(&second), None).await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);
    let gone = send(&app, "GET", "/profiles/self", Some(&second), None).await;
    assert_eq!(gone.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bad_credentials_map_to_status_codes() {
    let app = chute::router(common::app().await);
    send(&app, "POST", "/profiles/self", None, Some(json!({ "hash": "pw", "username": "al" }))).await;

    let again = send(&app, "POST", "/profiles/self", None, Some(json!({ "hash": "x", "username": "al" }))).await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let wrong = send(&app, "POST", "/actions/login", None, Some(json!({ "hash": "no", "username": "al" }))).await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert!(wrong.token.is_none());
    assert!(wrong.body["error"].is_string());

    let missing = send(&app, "GET", "/profiles/self", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    let bogus = send(&app, "GET", "/invites/1", Some("not-a-token"), None).await;
    assert_eq!(bogus.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invites_over_http() {
    let app = chute::router(common::app().await);
    let (_, organizer) = register(&app, "organizer").await;
    let (guest_id, guest) = register(&app, "guest").await;

    let created = send(
        &app,
        "POST",
        "/invites",
        Some(&organizer),
        Some(json!({
            "attendees": [guest_id],
            "start": "2026-04-01T10:00:00Z",
            "end": "2026-04-01T12:00:00Z",
            "place": "Studio 4",
            "message": { "body": "hi" }
        })),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["attendees"][0]["id"].as_i64(), Some(guest_id));
    assert_eq!(created.body["attendees"][0]["status"], "Pending");
    assert_eq!(created.body["messages"][0]["body"], "hi");
    let id = created.body["id"].as_i64().unwrap();

    let status = format!("/profiles/self/invites/{id}/status");
    let accepted = send(&app, "POST", &status, Some(&guest), Some(json!("Accepted"))).await;
    assert_eq!(accepted.status, StatusCode::OK);
    assert_eq!(accepted.body["attendees"][0]["status"], "Accepted");

    let unknown = send(&app, "POST", &status, Some(&guest), Some(json!("Maybe"))).await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
    let flipped = send(&app, "POST", &status, Some(&guest), Some(json!("Declined"))).await;
    assert_eq!(flipped.status, StatusCode::CONFLICT);

    let mine = send(
        &app,
        "GET",
        "/profiles/self/invites?status=Accepted&from=2026-03-01T00:00:00Z",
        Some(&guest),
        None,
    )
    .await;
    assert_eq!(mine.status, StatusCode::OK);
    assert_eq!(mine.body[0]["id"].as_i64(), Some(id));

    let uri = format!("/invites/{id}");
    let forbidden = send(&app, "DELETE", &uri, Some(&guest), None).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let cancelled = send(&app, "DELETE", &uri, Some(&organizer), None).await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(cancelled.body["active"], false);

    let missing = send(&app, "GET", "/invites/9999", Some(&guest), None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_takes_repeated_filters() {
    let state = common::app().await;
    let model = common::tagged(&state, &[1], &[1]).await;
    let photographer = common::tagged(&state, &[2], &[]).await;
    let stylist = common::tagged(&state, &[4], &[1]).await;
    for profile in [model, photographer, stylist] {
        state
            .freetimes
            .new_interval(profile, datetime!(2026-03-16 10:00 UTC), datetime!(2026-03-16 11:00 UTC))
            .await
            .unwrap();
    }

    let app = chute::router(state);
    let (_, token) = register(&app, "searcher").await;

    let ids = |reply: &Reply| -> Vec<i64> {
        reply
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_i64().unwrap())
            .collect()
    };

    let by_type = send(
        &app,
        "GET",
        "/profiles?from=2026-03-16T10:30:00Z&type=2&type=4",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(by_type.status, StatusCode::OK);
    assert_eq!(ids(&by_type), vec![photographer.0, stylist.0]);

    let flagged = send(
        &app,
        "GET",
        "/profiles?from=2026-03-16T10:30:00Z&type=2&type=4&flag=1",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(ids(&flagged), vec![stylist.0]);

    let garbled = send(&app, "GET", "/profiles?type=model", Some(&token), None).await;
    assert_eq!(garbled.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn freetimes_over_http() {
    let app = chute::router(common::app().await);
    let (id, token) = register(&app, "model").await;

    let created = send(
        &app,
        "POST",
        "/profiles/self/frees",
        Some(&token),
        Some(json!([
            { "start": "2099-01-02T10:00:00Z", "end": "2099-01-02T11:00:00Z" },
            { "start": "2099-01-01T10:00:00.25Z", "end": "2099-01-01T10:00:00.75Z" }
        ])),
    )
    .await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.body[0]["start"], "2099-01-01T10:00:00.25Z");
    assert_eq!(created.body[1]["start"], "2099-01-02T10:00:00Z");

    let backwards = send(
        &app,
        "POST",
        "/profiles/self/frees",
        Some(&token),
        Some(json!([{ "start": "2099-01-03T10:00:00Z", "end": "2099-01-03T09:00:00Z" }])),
    )
    .await;
    assert_eq!(backwards.status, StatusCode::BAD_REQUEST);

    let removed = send(
        &app,
        "DELETE",
        "/profiles/self/frees/2099-01-02T10:00:00Z",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);

    let theirs = send(&app, "GET", &format!("/profiles/{id}/frees"), Some(&token), None).await;
    assert_eq!(theirs.status, StatusCode::OK);
    assert_eq!(theirs.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn photos_over_http() {
    let app = chute::router(common::app().await);
    let (_, token) = register(&app, "photographer").await;
    let (_, other) = register(&app, "someone else").await;

    let added = send(
        &app,
        "POST",
        "/profiles/self/photos",
        Some(&token),
        Some(json!({ "caption": "test shot" })),
    )
    .await;
    assert_eq!(added.status, StatusCode::CREATED);
    assert_eq!(added.body["caption"], "test shot");
    let uri = format!("/profiles/self/photos/{}", added.body["id"]);

    let listed = send(&app, "GET", "/profiles/self/photos", Some(&token), None).await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);
    assert_eq!(send(&app, "GET", &uri, Some(&token), None).await.status, StatusCode::OK);
    assert_eq!(send(&app, "GET", &uri, Some(&other), None).await.status, StatusCode::NOT_FOUND);

    assert_eq!(send(&app, "DELETE", &uri, Some(&token), None).await.status, StatusCode::NO_CONTENT);
    assert_eq!(send(&app, "GET", &uri, Some(&token), None).await.status, StatusCode::NOT_FOUND);
}
