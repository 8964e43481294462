//! # Spotify Integration Module
//!
//! HTTP integration with the Spotify Web API and accounts service.
//!
//! ## Overview
//!
//! ```text
//! CLI Layer
//!     ↓
//! Spotify Integration Layer
//!     ├── auth     (client-credentials, authorization-code login)
//!     ├── artists  (artist search)
//!     └── library  (paginated, rate-limited saved-tracks fetch)
//!     ↓
//! HTTP Layer (reqwest, JSON)
//! ```
//!
//! ## Authentication
//!
//! [`auth`] offers two independent ways of getting a [`crate::types::Credential`]:
//!
//! - **Client credentials**: app-level token, no user context, used for search
//! - **Authorization code**: user-level token with `user-library-read`. The
//!   consent page is opened in the browser and the redirect is caught by the
//!   one-shot listener in [`crate::server`]
//!
//! Tokens are never cached; each run authenticates again.
//!
//! ## Library Fetch
//!
//! [`library::LibraryFetcher`] probes the saved-tracks total with a single
//! item request, derives the page offsets and fetches the pages in sequential
//! batches of concurrent requests:
//!
//! - **Ordering**: results are merged in offset order, not completion order
//! - **Rate Limits**: HTTP 429 suspends only the throttled request for the
//!   `Retry-After` delay (1 second if absent) before retrying the same offset
//! - **Partial Failure**: any other page failure is logged and the page is
//!   skipped; the run continues
//!
//! ## API Coverage
//!
//! - `POST /api/token` - Client-credentials and authorization-code grants
//! - `GET /search` - Artist search
//! - `GET /me/tracks` - Saved tracks with `limit` / `offset` paging
//!
//! ## Usage Patterns
//!
//! ```rust
//! let config = Config::from_env()?;
//! let token = spotify::auth::authenticate_user(&config).await?;
//! let liked = LibraryFetcher::new(&config).fetch_all_liked_songs(&token).await?;
//! println!("{} songs", liked.tracks.len());
//! ```

pub mod artists;
pub mod auth;
pub mod library;
