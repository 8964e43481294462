mod common;

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use axum::{Json, Router, routing::post};
use common::{MockLibrary, config_for, library_router, spawn, track_names};
use serde_json::json;
use spotlikes::{Error, cli::likes_with, config::Config};

/// Library mock plus a token endpoint that hands out the user token.
fn account(library: Arc<MockLibrary>) -> Router {
    library_router(library).route(
        "/api/token",
        post(|| async { Json(json!({ "access_token": "user-token" })) }),
    )
}

/// Browser stand-in that follows the consent page straight back to the
/// redirect URI with a code.
fn approving_browser(config: &Config) -> impl FnOnce(&str) -> io::Result<()> {
    let redirect = config.redirect_uri.clone().unwrap();
    move |_| {
        tokio::spawn(async move {
            reqwest::get(format!("{redirect}?code=granted")).await
        });
        Ok(())
    }
}

#[tokio::test]
async fn test_likes_writes_every_track() {
    let library = Arc::new(MockLibrary::new(120));
    let addr = spawn(account(Arc::clone(&library))).await;
    let dir = tempfile::tempdir().unwrap();

    let mut config = config_for(addr);
    config.output = dir.path().join("tmp").join("likedSongs.json");
    let browser = approving_browser(&config);

    let tracks = likes_with(&config, browser).await.unwrap();
    assert_eq!(tracks, track_names(0..120));

    let written = std::fs::read_to_string(&config.output).unwrap();
    let parsed: Vec<String> = serde_json::from_str(&written).unwrap();
    assert_eq!(parsed, track_names(0..120));
}

#[tokio::test]
async fn test_likes_writes_empty_list_for_empty_library() {
    let library = Arc::new(MockLibrary::new(0));
    let addr = spawn(account(Arc::clone(&library))).await;
    let dir = tempfile::tempdir().unwrap();

    let mut config = config_for(addr);
    config.output = dir.path().join("likedSongs.json");
    let browser = approving_browser(&config);

    let tracks = likes_with(&config, browser).await.unwrap();
    assert!(tracks.is_empty());
    assert_eq!(std::fs::read_to_string(&config.output).unwrap(), "[]");
    assert_eq!(library.request_count(), 1);
}

#[tokio::test]
async fn test_likes_without_secret_fails_before_login() {
    let library = Arc::new(MockLibrary::new(10));
    let addr = spawn(account(Arc::clone(&library))).await;
    let dir = tempfile::tempdir().unwrap();

    let mut config = config_for(addr);
    config.client_secret = None;
    config.output = dir.path().join("likedSongs.json");
    let opened = AtomicBool::new(false);

    let err = likes_with(&config, |_| {
        opened.store(true, Ordering::SeqCst);
        Ok(())
    })
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Configuration(ref msg) if msg.contains("SPOTIFY_CLIENT_SECRET")));
    assert!(!opened.load(Ordering::SeqCst));
    assert_eq!(library.request_count(), 0);
    assert!(!config.output.exists());
}
