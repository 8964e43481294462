use std::io;

use crate::{
    config::Config,
    error::Result,
    management::{JsonFileSink, ResultSink},
    spotify::{auth, library::LibraryFetcher},
    success,
};

/// Logs in, fetches the whole saved-tracks library and writes it to the
/// configured output file.
pub async fn likes(config: &Config) -> Result<Vec<String>> {
    likes_with(config, |url| webbrowser::open(url)).await
}

/// Same as [`likes`], with `open_browser` launching the consent page.
///
/// Configuration is validated before anything is bound or opened. An empty
/// library still writes an empty list to the output file.
pub async fn likes_with<F>(config: &Config, open_browser: F) -> Result<Vec<String>>
where
    F: FnOnce(&str) -> io::Result<()>,
{
    let sink = JsonFileSink::new(&config.output);
    let token = auth::authenticate_user_with(config, open_browser).await?;
    let liked = LibraryFetcher::new(config)
        .fetch_all_liked_songs(&token)
        .await?;

    sink.store(&liked.tracks).await?;
    success!(
        "Saved {} of {} liked songs to {}",
        liked.tracks.len(),
        liked.total,
        sink.path().display()
    );

    Ok(liked.tracks)
}
