//! # Spotify Integration Module
//!
//! Thin HTTP layer over the Spotify services the backend depends on. Every
//! function takes the shared `reqwest::Client` and the base URL it talks to,
//! so the same code runs against the real services and against local fakes.
//!
//! ## Services
//!
//! ```text
//! accounts.spotify.com     authorize redirect, authorization_code and
//!                          refresh_token grants            -> auth
//! api.spotify.com/v1       GET /me (token check)           -> auth
//!                          GET /me/player                  -> player
//! open.spotify.com         web player token from the
//!                          sp_dc session cookie            -> auth
//! spclient.wg.spotify.com  color-lyrics/v2/track/{id}      -> lyrics
//! ```
//!
//! ## Two credentials
//!
//! The public Web API is reached with the OAuth pair managed by
//! [`crate::management::PlaybackAuthManager`]. The lyrics endpoint is not part
//! of the public API and only accepts the web player token derived from the
//! browser session cookie, managed by
//! [`crate::management::LyricsAuthManager`].
//!
//! ## Error Types
//!
//! - **`reqwest::Error`** - network issues and non-success statuses from the
//!   plain request functions
//! - [`lyrics::LyricsUnavailable`] - internal to [`lyrics::LyricsClient`],
//!   which never surfaces it and returns empty lyrics instead

pub mod auth;
pub mod lyrics;
pub mod player;

pub use lyrics::LyricsClient;
