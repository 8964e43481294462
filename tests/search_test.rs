mod common;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use common::{config_for, spawn};
use serde_json::json;
use spotlikes::{
    Error, cli,
    spotify::artists::search_artist,
    types::{Credential, Scope},
};

type Captured = Arc<Mutex<Vec<(Option<String>, HashMap<String, String>)>>>;

/// Search endpoint that records the `authorization` header and query of
/// every request.
fn catalogue(status: StatusCode, body: serde_json::Value) -> (Router, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&captured);
    let router = Router::new().route(
        "/search",
        get(move |headers: HeaderMap, Query(query): Query<HashMap<String, String>>| {
            let recorder = Arc::clone(&recorder);
            let body = body.clone();
            async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                recorder.lock().unwrap().push((auth, query));
                let response: Response = (status, Json(body)).into_response();
                response
            }
        }),
    );
    (router, captured)
}

fn artists(items: serde_json::Value) -> serde_json::Value {
    json!({ "artists": { "items": items, "total": 2 } })
}

fn app_token() -> Credential {
    Credential::new("app-token", Scope::Public)
}

#[tokio::test]
async fn test_search_returns_first_artist() {
    let (router, captured) = catalogue(
        StatusCode::OK,
        artists(json!([
            { "id": "4NHQ", "name": "Tove Lo", "genres": ["pop"], "popularity": 70 },
            { "id": "9XYZ", "name": "Tove Styrke" }
        ])),
    );
    let addr = spawn(router).await;

    let artist = search_artist(&config_for(addr), "Tove Lo", &app_token())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(artist.id, "4NHQ");
    assert_eq!(artist.name, "Tove Lo");

    let requests = captured.lock().unwrap();
    let (auth, query) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer app-token"));
    assert_eq!(query["q"], "Tove Lo");
    assert_eq!(query["type"], "artist");
    assert_eq!(query["limit"], "1");
}

#[tokio::test]
async fn test_search_without_match_returns_none() {
    let (router, _) = catalogue(StatusCode::OK, artists(json!([])));
    let addr = spawn(router).await;

    let artist = search_artist(&config_for(addr), "Nobody", &app_token())
        .await
        .unwrap();
    assert!(artist.is_none());
}

#[tokio::test]
async fn test_search_error_status_is_a_fetch_error() {
    let (router, _) = catalogue(
        StatusCode::UNAUTHORIZED,
        json!({ "error": { "status": 401, "message": "Invalid access token" } }),
    );
    let addr = spawn(router).await;

    let err = search_artist(&config_for(addr), "Tove Lo", &app_token())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Fetch(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_search_command_uses_app_token() {
    let (router, captured) = catalogue(
        StatusCode::OK,
        artists(json!([{ "id": "4NHQ", "name": "Tove Lo" }])),
    );
    let router = router.route(
        "/api/token",
        post(|| async { Json(json!({ "access_token": "app-token" })) }),
    );
    let addr = spawn(router).await;

    cli::search(&config_for(addr), "Tove Lo").await.unwrap();

    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0.as_deref(), Some("Bearer app-token"));
}
