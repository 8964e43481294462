//! # CLI Module
//!
//! Implementations of the user-facing commands. Each command receives the
//! [`crate::config::Config`] built at startup and reports progress through the
//! console macros exported by the crate root.
//!
//! - [`search`] - Looks up an artist with an app-level token and prints the
//!   first match as a table
//! - [`likes`] - Runs the browser login, fetches every saved track and writes
//!   the names to a JSON file
//!
//! ```bash
//! spotlikes search "Tove Lo"
//! spotlikes likes --output tmp/likedSongs.json
//! ```

mod likes;
mod search;

pub use likes::{likes, likes_with};
pub use search::search;
