use std::fmt;

use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// What a [`Credential`] is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// App-level token from the client-credentials grant; public data only.
    Public,
    /// User token with read access to the saved-tracks library.
    LibraryRead,
}

/// A bearer token for the Web API.
///
/// Expiry is not tracked: every run authenticates again.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub scope: Scope,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, scope: Scope) -> Self {
        Self {
            access_token: access_token.into(),
            scope,
        }
    }

    pub fn bearer(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("scope", &self.scope)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchArtistsResponse {
    pub artists: ArtistsContainer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistsContainer {
    pub items: Vec<Artist>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub followers: Option<Followers>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Followers {
    pub total: Option<u64>,
}

#[derive(Tabled)]
pub struct ArtistTableRow {
    pub name: String,
    pub id: String,
    pub genres: String,
    pub popularity: String,
    pub followers: String,
}

impl From<&Artist> for ArtistTableRow {
    fn from(a: &Artist) -> Self {
        ArtistTableRow {
            name: a.name.clone(),
            id: a.id.clone(),
            genres: a.genres.iter().take(3).cloned().collect::<Vec<_>>().join(","),
            popularity: a.popularity.map(|p| p.to_string()).unwrap_or_default(),
            followers: a
                .followers
                .as_ref()
                .and_then(|f| f.total)
                .map(|t| t.to_string())
                .unwrap_or_default(),
        }
    }
}

/// One page of `GET /me/tracks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTracksPage {
    pub total: u64,
    #[serde(default)]
    pub items: Vec<SavedTrackItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTrackItem {
    /// `null` for tracks that are no longer available.
    pub track: Option<SavedTrack>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTrack {
    pub name: String,
}

impl SavedTracksPage {
    pub fn track_names(self) -> Vec<String> {
        self.items
            .into_iter()
            .filter_map(|item| item.track.map(|t| t.name))
            .collect()
    }
}

/// Outcome of a bulk saved-tracks fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LikedSongs {
    /// Item count reported by the probe request.
    pub total: u64,
    /// Number of pages requested.
    pub pages: usize,
    /// Offsets of pages that failed and contributed nothing.
    pub failed_offsets: Vec<u64>,
    /// Track names in ascending offset order.
    pub tracks: Vec<String>,
}
