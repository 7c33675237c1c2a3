//! # API Module
//!
//! HTTP endpoints of the nowplaying backend, served by [`crate::server`].
//!
//! ## Endpoints
//!
//! ### Playback
//!
//! - [`currently_playing`] - `GET /currently-playing`. Playback snapshot with
//!   synced lyrics. Answers `200 {"message": "No song is currently playing"}`
//!   when idle. Lyrics failures never fail the snapshot; they degrade to an
//!   empty document.
//! - [`download_current_song`] - `GET /download-current-song`. Streams the
//!   current track as MP3 with `X-Song-Name`/`X-Artist-Name` headers. `404`
//!   when idle, `500` when no video is found or extraction fails.
//!
//! ### Authentication
//!
//! - [`authorize`] - redirects to the Spotify consent screen (path configurable,
//!   `/authorize` by default).
//! - [`callback`] - exchanges the returned code and persists the token pair.
//! - [`index`] - landing page the callback redirects to.
//!
//! ### Monitoring
//!
//! - [`health`] - status, version and whether a refresh token is on hand.
//!
//! ## Errors
//!
//! Handlers return [`ApiError`], which renders as JSON `{message, detail?}`
//! with the matching status code.

mod callback;
mod download;
mod error;
mod health;
mod playing;

pub use callback::authorize;
pub use callback::callback;
pub use callback::index;
pub use download::ARTIST_NAME_HEADER;
pub use download::SONG_NAME_HEADER;
pub use download::download_current_song;
pub use error::ApiError;
pub use health::health;
pub use playing::currently_playing;
