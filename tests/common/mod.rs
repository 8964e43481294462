#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use spotlikes::{config::Config, spotify::library::Sleeper};

/// Serves `router` on an ephemeral loopback port.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Returns a loopback port that was free a moment ago.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

pub fn config_for(addr: SocketAddr) -> Config {
    Config {
        client_id: Some("client-id".to_string()),
        client_secret: Some("client-secret".to_string()),
        redirect_uri: Some(format!("http://127.0.0.1:{}/callback", free_port())),
        api_url: format!("http://{addr}"),
        token_url: format!("http://{addr}/api/token"),
        auth_url: format!("http://{addr}/authorize"),
        ..Config::default()
    }
}

/// A sleeper that records requested delays and returns immediately.
pub fn recording_sleeper() -> (Sleeper, Arc<Mutex<Vec<Duration>>>) {
    let delays = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&delays);
    let sleeper: Sleeper = Arc::new(move |delay| {
        recorded.lock().unwrap().push(delay);
        Box::pin(async {})
    });
    (sleeper, delays)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Start { offset: u64, limit: u64 },
    End { offset: u64, limit: u64 },
}

/// In-memory saved-tracks library behind `GET /me/tracks`.
///
/// Track `i` is named `Track i`.
#[derive(Default)]
pub struct MockLibrary {
    /// Items that actually exist.
    pub total: u64,
    /// Total reported to callers, when it differs from `total`.
    pub reported_total: Option<u64>,
    /// Offsets answered with HTTP 500.
    pub fail_offsets: Vec<u64>,
    /// Offset -> remaining 429 answers and the `retry-after` value to send.
    pub throttle: Mutex<HashMap<u64, (u32, Option<String>)>>,
    /// Remaining 429 answers for the `limit=1` probe.
    pub probe_throttle: Mutex<u32>,
    /// Artificial latency per page offset.
    pub delays: HashMap<u64, Duration>,
    pub events: Mutex<Vec<Event>>,
}

impl MockLibrary {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn throttle(self, offset: u64, times: u32, retry_after: Option<&str>) -> Self {
        self.throttle
            .lock()
            .unwrap()
            .insert(offset, (times, retry_after.map(str::to_string)));
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Page requests (the `limit=1` probe excluded) for `offset`.
    pub fn page_requests(&self, offset: u64) -> usize {
        self.events()
            .iter()
            .filter(|e| {
                matches!(e, Event::Start { offset: o, limit } if *o == offset && *limit > 1)
            })
            .count()
    }

    pub fn request_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Start { .. }))
            .count()
    }
}

pub fn library_router(library: Arc<MockLibrary>) -> Router {
    Router::new()
        .route("/me/tracks", get(saved_tracks))
        .with_state(library)
}

pub async fn spawn_library(library: Arc<MockLibrary>) -> SocketAddr {
    spawn(library_router(library)).await
}

async fn saved_tracks(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    State(library): State<Arc<MockLibrary>>,
) -> Response {
    assert_eq!(
        headers.get("authorization").and_then(|v| v.to_str().ok()),
        Some("Bearer user-token")
    );

    let limit: u64 = params["limit"].parse().unwrap();
    let offset: u64 = params["offset"].parse().unwrap();
    let record = |event| library.events.lock().unwrap().push(event);
    record(Event::Start { offset, limit });

    if limit == 1 {
        let mut remaining = library.probe_throttle.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            drop(remaining);
            record(Event::End { offset, limit });
            return StatusCode::TOO_MANY_REQUESTS.into_response();
        }
    }

    let throttled = {
        let mut throttle = library.throttle.lock().unwrap();
        match throttle.get_mut(&offset) {
            Some((remaining, retry_after)) if *remaining > 0 && limit > 1 => {
                *remaining -= 1;
                Some(retry_after.clone())
            }
            _ => None,
        }
    };
    if let Some(retry_after) = throttled {
        record(Event::End { offset, limit });
        let mut response = StatusCode::TOO_MANY_REQUESTS.into_response();
        if let Some(value) = retry_after {
            response
                .headers_mut()
                .insert("retry-after", value.parse().unwrap());
        }
        return response;
    }

    if limit > 1 {
        if let Some(delay) = library.delays.get(&offset) {
            tokio::time::sleep(*delay).await;
        }
    }

    if limit > 1 && library.fail_offsets.contains(&offset) {
        record(Event::End { offset, limit });
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let end = (offset + limit).min(library.total);
    let items: Vec<_> = (offset.min(end)..end)
        .map(|i| json!({ "track": { "name": format!("Track {i}") } }))
        .collect();

    record(Event::End { offset, limit });
    axum::Json(json!({
        "total": library.reported_total.unwrap_or(library.total),
        "items": items,
    }))
    .into_response()
}

pub fn track_names(range: std::ops::Range<u64>) -> Vec<String> {
    range.map(|i| format!("Track {i}")).collect()
}
