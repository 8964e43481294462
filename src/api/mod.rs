//! # API Module
//!
//! HTTP handlers served by the local OAuth callback listener.
//!
//! - [`callback`] - Receives the provider redirect, exchanges the authorization
//!   code for a user token and resolves the pending authorization. Answers the
//!   browser in plain text: `200` on success, `400` when no code is present,
//!   `500` when the exchange fails and `410` for any request after the first.
//!
//! See [`crate::server`] for the listener lifecycle.

mod callback;

pub use callback::callback;
