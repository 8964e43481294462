use reqwest::Client;

use crate::{
    config::Config,
    error::{Error, Result},
    types::{Artist, Credential, SearchArtistsResponse},
};

/// Searches the catalogue for artists matching `name` and returns the best
/// match.
///
/// # Arguments
///
/// * `config` - Supplies the Web API base URL
/// * `name` - Free-text artist name
/// * `token` - Any valid credential; an app token is enough
///
/// # Returns
///
/// - `Ok(Some(Artist))` - The first artist of the result list
/// - `Ok(None)` - Nothing matched
/// - `Err(Error::Fetch)` - Network error, non-success status or malformed body
///
/// # Example
///
/// ```
/// let token = spotify::auth::acquire_app_token(&config).await?;
/// if let Some(artist) = search_artist(&config, "Tove Lo", &token).await? {
///     println!("{}", artist.name);
/// }
/// ```
pub async fn search_artist(
    config: &Config,
    name: &str,
    token: &Credential,
) -> Result<Option<Artist>> {
    let api_url = format!("{}/search", config.api_url.trim_end_matches('/'));

    let response = Client::new()
        .get(&api_url)
        .bearer_auth(token.bearer())
        .query(&[("q", name), ("type", "artist"), ("limit", "1")])
        .send()
        .await?
        .error_for_status()?;

    let res = response
        .json::<SearchArtistsResponse>()
        .await
        .map_err(|e| Error::Fetch(format!("invalid search response: {e}")))?;

    Ok(res.artists.items.into_iter().next())
}
