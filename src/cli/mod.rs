//! # CLI Module
//!
//! Operator commands of the nowplaying backend. Every command except shell
//! completions loads the configuration first and refuses to start when a
//! required variable is missing.
//!
//! ## Commands
//!
//! - [`serve`] - Runs the HTTP API with the periodic token keep-alive. This is
//!   what a deployment runs.
//! - [`auth`] - One-time consent flow from the terminal: starts the server,
//!   opens the browser and waits for the callback to store the token pair.
//! - [`now_playing`] - Prints the current snapshot (and lyrics) as tables.
//! - [`download`] - Runs the media pipeline for the current track and keeps
//!   the MP3 locally.
//!
//! ## Usage Patterns
//!
//! ```bash
//! nowplaying auth                      # connect the Spotify account once
//! nowplaying serve                     # serve the companion UI
//! nowplaying now-playing --lyrics      # check what the UI would see
//! nowplaying download --output ~/Music
//! ```

mod auth;
mod download;
mod now_playing;
mod serve;

use std::sync::Arc;

pub use auth::auth;
pub use download::{download, save_current_song};
pub use now_playing::now_playing;
pub use serve::serve;

use crate::{config, error, server::AppState};

/// Loads `.env`, validates the settings and builds the shared state. Exits
/// the process with a message on any failure.
async fn load_state() -> AppState {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let settings = match config::Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("Invalid configuration, {}", e),
    };

    match AppState::build(Arc::new(settings)).await {
        Ok(state) => state,
        Err(e) => error!("Cannot load Spotify tokens: {}", e),
    }
}
