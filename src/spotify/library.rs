use std::{sync::Arc, time::Duration};

use futures::future::{BoxFuture, join_all};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, StatusCode, header::HeaderMap};

use crate::{
    config::{Config, MAX_PAGE_SIZE},
    error::{Error, Result},
    info,
    types::{Credential, LikedSongs, SavedTracksPage},
    warning,
};

/// Delay used when a 429 response carries no usable `retry-after` header.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Suspends the current fetch for the given duration.
///
/// Swappable so tests can observe backoff without waiting on the clock.
pub type Sleeper = Arc<dyn Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync>;

pub fn tokio_sleeper() -> Sleeper {
    Arc::new(|delay| Box::pin(tokio::time::sleep(delay)))
}

#[derive(Debug)]
enum PageError {
    Throttled(Duration),
    Failed(String),
}

impl std::fmt::Display for PageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageError::Throttled(delay) => write!(f, "rate limited for {}s", delay.as_secs()),
            PageError::Failed(msg) => f.write_str(msg),
        }
    }
}

/// Bulk reader for the user's saved-tracks library.
///
/// The library is read in pages of `page_size` items. Pages are requested in
/// sequential batches of at most `concurrency` requests; a batch is fully
/// settled before the next one is dispatched, and its results are appended in
/// offset order regardless of which request finished first.
///
/// Every request, the initial size probe included, is retried on HTTP 429
/// after the delay the server asks for. Any other failure of a page is logged
/// and the page contributes nothing; the run carries on.
pub struct LibraryFetcher {
    client: Client,
    tracks_url: String,
    page_size: u64,
    concurrency: usize,
    max_throttle_retries: Option<u32>,
    sleeper: Sleeper,
}

impl LibraryFetcher {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            tracks_url: format!("{}/me/tracks", config.api_url.trim_end_matches('/')),
            page_size: config.page_size.clamp(1, MAX_PAGE_SIZE),
            concurrency: config.concurrency.max(1),
            max_throttle_retries: config.max_throttle_retries,
            sleeper: tokio_sleeper(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Retrieves the names of every track saved in the user's library.
    ///
    /// # Arguments
    ///
    /// * `token` - User credential with library read access
    ///
    /// # Returns
    ///
    /// - `Ok(LikedSongs)` - Track names in ascending offset order, together with
    ///   the probed total, the number of pages and the offsets of failed pages
    /// - `Err(Error::Fetch)` - The size probe could not be completed
    ///
    /// # Consistency
    ///
    /// The total is read once by the probe. If the library shrinks during the
    /// run, pages past the new end come back empty or fail and simply add no
    /// items; nothing is reconciled.
    pub async fn fetch_all_liked_songs(&self, token: &Credential) -> Result<LikedSongs> {
        let total = self.probe(token).await?;
        info!("Total liked songs: {}", total);

        let offsets = page_offsets(total, self.page_size);
        info!("Fetching data in {} pages...", offsets.len());

        let pb = ProgressBar::new(offsets.len() as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.blue} [{bar:30.cyan/blue}] {pos}/{len} pages {msg}",
        ) {
            pb.set_style(style.progress_chars("=> "));
        }

        let mut liked = LikedSongs {
            total,
            pages: offsets.len(),
            ..LikedSongs::default()
        };

        for batch in offsets.chunks(self.concurrency) {
            let requests = batch
                .iter()
                .map(|&offset| self.fetch_page(token, offset, &pb));
            let pages = join_all(requests).await;

            for (&offset, page) in batch.iter().zip(pages) {
                match page {
                    Some(names) => liked.tracks.extend(names),
                    None => liked.failed_offsets.push(offset),
                }
            }
            pb.set_message(format!("{} songs", liked.tracks.len()));
        }

        pb.finish_and_clear();
        info!("Total songs fetched: {}", liked.tracks.len());
        if !liked.failed_offsets.is_empty() {
            warning!(
                "{} page(s) could not be fetched and were skipped",
                liked.failed_offsets.len()
            );
        }

        Ok(liked)
    }

    async fn probe(&self, token: &Credential) -> Result<u64> {
        let page = self
            .request_with_backoff(token, 0, 1, &ProgressBar::hidden())
            .await
            .map_err(|e| Error::Fetch(format!("could not read library size: {e}")))?;
        Ok(page.total)
    }

    async fn fetch_page(
        &self,
        token: &Credential,
        offset: u64,
        pb: &ProgressBar,
    ) -> Option<Vec<String>> {
        let result = self.request_with_backoff(token, offset, self.page_size, pb).await;
        pb.inc(1);

        match result {
            Ok(page) => {
                let names = page.track_names();
                pb.suspend(|| info!("Fetched {} songs for offset {}", names.len(), offset));
                Some(names)
            }
            Err(e) => {
                pb.suspend(|| warning!("Error fetching songs for offset {}: {}", offset, e));
                None
            }
        }
    }

    async fn request_with_backoff(
        &self,
        token: &Credential,
        offset: u64,
        limit: u64,
        pb: &ProgressBar,
    ) -> std::result::Result<SavedTracksPage, PageError> {
        let mut retries: u32 = 0;

        loop {
            match self.request_page(token, offset, limit).await {
                Err(PageError::Throttled(delay)) => {
                    if let Some(max) = self.max_throttle_retries {
                        if retries >= max {
                            return Err(PageError::Failed(format!(
                                "still rate limited after {max} retries"
                            )));
                        }
                    }
                    retries += 1;

                    pb.suspend(|| {
                        warning!("Rate limited. Retrying after {} seconds.", delay.as_secs())
                    });
                    (self.sleeper)(delay).await;
                }
                other => return other,
            }
        }
    }

    async fn request_page(
        &self,
        token: &Credential,
        offset: u64,
        limit: u64,
    ) -> std::result::Result<SavedTracksPage, PageError> {
        let response = self
            .client
            .get(&self.tracks_url)
            .bearer_auth(token.bearer())
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await
            .map_err(|e| PageError::Failed(e.to_string()))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(PageError::Throttled(retry_after(response.headers())));
        }

        let response = response
            .error_for_status()
            .map_err(|e| PageError::Failed(e.to_string()))?;

        response
            .json::<SavedTracksPage>()
            .await
            .map_err(|e| PageError::Failed(format!("invalid page body: {e}")))
    }
}

/// Offsets of every page needed to cover `total` items, `limit` items per page.
///
/// ```text
/// page_offsets(120, 50) == [0, 50, 100]
/// ```
pub fn page_offsets(total: u64, limit: u64) -> Vec<u64> {
    let limit = limit.max(1);
    (0..total.div_ceil(limit)).map(|page| page * limit).collect()
}

/// Parses a `retry-after` value in whole seconds.
///
/// Falls back to [`DEFAULT_RETRY_AFTER`] when the value is missing or not a
/// non-negative integer.
pub fn parse_retry_after(value: Option<&str>) -> Duration {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

fn retry_after(headers: &HeaderMap) -> Duration {
    parse_retry_after(
        headers
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok()),
    )
}
