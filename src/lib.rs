//! Companion backend for a "now playing" UI.
//!
//! This library exposes the track currently playing on a Spotify account
//! together with its synced lyrics, and can turn that track into an MP3 by
//! searching YouTube and running `yt-dlp`. Two independent credentials are
//! kept alive for that: the OAuth pair of the public Web API and a web
//! player token derived from the `sp_dc` browser cookie, which is the only
//! way into the lyrics endpoint.
//!
//! # Modules
//!
//! - `api` - HTTP handlers of the local server
//! - `cli` - Command-line interface implementations
//! - `common` - Provider endpoints and other fixed values
//! - `config` - Configuration management and environment variables
//! - `management` - Token persistence and the two credential managers
//! - `media` - Video search, audio extraction and temporary file lifecycle
//! - `server` - Shared state, router and listener
//! - `snapshot` - Assembly of the `/currently-playing` payload
//! - `spotify` - Spotify HTTP calls and the lyrics client
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use nowplaying::{config, server};
//!
//! #[tokio::main]
//! async fn main() -> nowplaying::Res<()> {
//!     config::load_env().await?;
//!     let settings = Arc::new(config::Settings::from_env()?);
//!     let state = server::AppState::build(settings).await?;
//!     server::start_api_server(state).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod common;
pub mod config;
pub mod management;
pub mod media;
pub mod server;
pub mod snapshot;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Provides a standard error handling pattern throughout the application
/// using a boxed dynamic error trait object. This allows for flexible
/// error handling while maintaining Send + Sync bounds for async contexts.
///
/// # Type Parameters
///
/// - `T` - The success type returned on successful operations
///
/// # Example
///
/// ```
/// use nowplaying::Res;
///
/// async fn fetch_data() -> Res<String> {
///     Ok("data".to_string())
/// }
/// ```
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// Creates a formatted output line with a distinctive blue "o" indicator
/// followed by the provided message. Used for general information and
/// status updates throughout the application.
///
/// # Arguments
///
/// The macro accepts the same arguments as `println!`, supporting format
/// strings and interpolation.
///
/// # Example
///
/// ```
/// info!("Starting download: {}", url);
/// info!("Server running on http://{}", addr);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// Creates a formatted output line with a green "✓" indicator to signify
/// successful completion of operations. Used to provide positive feedback
/// when operations complete successfully.
///
/// # Arguments
///
/// The macro accepts the same arguments as `println!`, supporting format
/// strings and interpolation.
///
/// # Example
///
/// ```
/// success!("Authentication successful!");
/// success!("Saved {}", path.display());
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Creates a formatted error output with a red "!" indicator and immediately
/// terminates the program with exit code 1. Used for unrecoverable errors
/// that require immediate program termination.
///
/// # Arguments
///
/// The macro accepts the same arguments as `println!`, supporting format
/// strings and interpolation.
///
/// # Behavior
///
/// This macro will cause the program to exit immediately after printing
/// the error message. It should only be used for fatal errors where
/// recovery is not possible.
///
/// # Example
///
/// ```
/// error!("Invalid configuration, {}", e);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Creates a formatted output line with a yellow "!" indicator to highlight
/// potential issues or important notices that don't require program termination.
/// Used for recoverable issues or important information that users should notice.
///
/// # Arguments
///
/// The macro accepts the same arguments as `println!`, supporting format
/// strings and interpolation.
///
/// # Example
///
/// ```
/// warning!("No lyrics for {}: {}", track_id, e);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
