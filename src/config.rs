//! Configuration management for spotlikes.
//!
//! Settings come from environment variables, optionally pre-populated from a
//! `.env` file. They are read exactly once into a [`Config`] value which is
//! then handed to the operations that need it; nothing below reads the
//! environment on its own.
//!
//! Lookup order:
//! 1. Environment variables (highest priority)
//! 2. `.env` in the current working directory
//! 3. `.env` in the local data directory (`<data_local_dir>/spotlikes/.env`)
//! 4. Application defaults (where applicable)

use std::{env, net::SocketAddr, path::PathBuf};

use reqwest::Url;

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_SCOPE: &str = "user-library-read";
pub const DEFAULT_OUTPUT: &str = "tmp/likedSongs.json";
pub const DEFAULT_CALLBACK_PORT: u16 = 8888;

/// Maximum page size accepted by the saved-tracks endpoint.
pub const MAX_PAGE_SIZE: u64 = 50;
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Loads `.env` files into the process environment.
///
/// Both the working directory and the platform-specific local data directory
/// are consulted. Variables already present in the environment are never
/// overwritten, and a missing file is not an error.
///
/// # Errors
///
/// Returns an error if the local data directory cannot be created.
pub async fn load_env() -> std::result::Result<(), String> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotlikes/.env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    dotenv::dotenv().ok();
    dotenv::from_path(path).ok();
    Ok(())
}

/// Runtime configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub api_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub scope: String,
    pub output: PathBuf,
    pub page_size: u64,
    pub concurrency: usize,
    /// `None` retries throttled requests forever.
    pub max_throttle_retries: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            api_url: DEFAULT_API_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            page_size: MAX_PAGE_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            max_throttle_retries: None,
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset. Credentials are optional at this
    /// stage; each operation validates what it needs through
    /// [`Config::app_credentials`] or [`Config::authorization`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let page_size = match get("SPOTLIKES_PAGE_SIZE") {
            Some(raw) => parse_number::<u64>("SPOTLIKES_PAGE_SIZE", &raw)?.clamp(1, MAX_PAGE_SIZE),
            None => defaults.page_size,
        };
        let concurrency = match get("SPOTLIKES_CONCURRENCY") {
            Some(raw) => parse_number::<usize>("SPOTLIKES_CONCURRENCY", &raw)?.max(1),
            None => defaults.concurrency,
        };
        let max_throttle_retries = get("SPOTLIKES_MAX_THROTTLE_RETRIES")
            .map(|raw| parse_number::<u32>("SPOTLIKES_MAX_THROTTLE_RETRIES", &raw))
            .transpose()?;

        Ok(Self {
            client_id: get("SPOTIFY_CLIENT_ID"),
            client_secret: get("SPOTIFY_CLIENT_SECRET"),
            redirect_uri: get("SPOTIFY_REDIRECT_URI"),
            api_url: get("SPOTIFY_API_URL").unwrap_or(defaults.api_url),
            auth_url: get("SPOTIFY_AUTH_URL").unwrap_or(defaults.auth_url),
            token_url: get("SPOTIFY_TOKEN_URL").unwrap_or(defaults.token_url),
            scope: get("SPOTIFY_SCOPE").unwrap_or(defaults.scope),
            output: get("SPOTLIKES_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or(defaults.output),
            page_size,
            concurrency,
            max_throttle_retries,
        })
    }

    /// Application identifier and secret, required by both token grants.
    pub fn app_credentials(&self) -> Result<(&str, &str)> {
        let id = require(&self.client_id, "SPOTIFY_CLIENT_ID")?;
        let secret = require(&self.client_secret, "SPOTIFY_CLIENT_SECRET")?;
        Ok((id, secret))
    }

    /// Everything the authorization-code flow needs: identifier, secret and
    /// redirect target.
    pub fn authorization(&self) -> Result<AuthorizationSettings<'_>> {
        let (client_id, client_secret) = self.app_credentials()?;
        let redirect_uri = require(&self.redirect_uri, "SPOTIFY_REDIRECT_URI")?;
        let redirect = Url::parse(redirect_uri).map_err(|e| {
            Error::Configuration(format!("SPOTIFY_REDIRECT_URI is not a valid URL: {e}"))
        })?;

        let port = redirect.port_or_known_default().unwrap_or(DEFAULT_CALLBACK_PORT);
        let callback_path = match redirect.path() {
            "" => "/".to_string(),
            path => path.to_string(),
        };

        Ok(AuthorizationSettings {
            client_id,
            client_secret,
            redirect_uri,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], port)),
            callback_path,
        })
    }
}

/// Validated settings for one authorization-code login.
#[derive(Debug, Clone)]
pub struct AuthorizationSettings<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub redirect_uri: &'a str,
    /// Loopback address the callback listener binds.
    pub listen_addr: SocketAddr,
    /// Path of the redirect target, routed by the listener.
    pub callback_path: String,
}

fn require<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| Error::Configuration(format!("{key} must be set")))
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| Error::Configuration(format!("{key} must be a number, got `{raw}`")))
}
