//! Configuration management for the nowplaying backend.
//!
//! Values come from environment variables, optionally seeded from `.env`
//! files. The lookup order is:
//! 1. Process environment (highest priority, never overridden)
//! 2. `.env` file in the local data directory
//! 3. `.env` file in the working directory
//! 4. Application defaults for everything that is not a credential
//!
//! All values are read once into a [`Settings`] record at startup. Missing
//! credentials fail the whole load with a single [`ConfigError`] so that the
//! operator sees every problem at once instead of an obscure runtime error on
//! the first request.

use std::{env, fmt, net::SocketAddr, path::PathBuf, time::Duration};

use crate::{common, management::LyricsRefreshPolicy};

/// Loads environment variables from `.env` files.
///
/// The file in the local data directory is read first, then the one in the
/// working directory. Variables that are already set in the process
/// environment keep their values. Missing files are not an error.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/nowplaying/.env`
/// - macOS: `~/Library/Application Support/nowplaying/.env`
/// - Windows: `%LOCALAPPDATA%/nowplaying/.env`
///
/// # Errors
///
/// Returns an error string if the data directory cannot be created or an
/// existing `.env` file cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    dotenv::dotenv().ok();
    Ok(())
}

/// Returns the directory holding `.env` and the token cache.
///
/// `NOWPLAYING_DATA_DIR` overrides the platform default.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = env::var("NOWPLAYING_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(common::APP_DIR);
    path
}

/// Routes the server always registers. The authorize path may not reuse them.
pub const RESERVED_PATHS: [&str; 5] = [
    "/",
    "/health",
    "/callback",
    "/currently-playing",
    "/download-current-song",
];

/// Every configuration problem found while building [`Settings`].
#[derive(Debug, Default)]
pub struct ConfigError {
    pub missing: Vec<&'static str>,
    pub invalid: Vec<String>,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing variables: {}", self.missing.join(", ")));
        }
        if !self.invalid.is_empty() {
            parts.push(format!("invalid values: {}", self.invalid.join("; ")));
        }
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ConfigError {}

/// Base URLs of every remote service the backend talks to.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub spotify_auth_url: String,
    pub spotify_token_url: String,
    pub spotify_api_url: String,
    pub spotify_web_token_url: String,
    pub spotify_lyrics_url: String,
    pub youtube_api_url: String,
    pub youtube_watch_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            spotify_auth_url: common::SPOTIFY_API_AUTH_URL.to_string(),
            spotify_token_url: common::SPOTIFY_API_TOKEN_URL.to_string(),
            spotify_api_url: common::SPOTIFY_API_URL.to_string(),
            spotify_web_token_url: common::SPOTIFY_WEB_TOKEN_URL.to_string(),
            spotify_lyrics_url: common::SPOTIFY_LYRICS_URL.to_string(),
            youtube_api_url: common::YOUTUBE_API_URL.to_string(),
            youtube_watch_url: common::YOUTUBE_WATCH_URL.to_string(),
        }
    }
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server_address: SocketAddr,
    pub authorize_path: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub sp_dc: String,
    pub youtube_api_key: String,
    pub data_dir: PathBuf,
    pub download_dir: PathBuf,
    pub download_timeout: Duration,
    pub yt_dlp_path: String,
    pub lyrics_policy: LyricsRefreshPolicy,
    pub endpoints: Endpoints,
}

impl Settings {
    /// Builds settings from the process environment.
    ///
    /// Call [`load_env`] first to pick up `.env` files.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Empty values count as
    /// missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut errors = ConfigError::default();

        let mut required = |key: &'static str| match get(key) {
            Some(value) => value,
            None => {
                errors.missing.push(key);
                String::new()
            }
        };

        let client_id = required("SPOTIFY_API_AUTH_CLIENT_ID");
        let client_secret = required("SPOTIFY_API_AUTH_CLIENT_SECRET");
        let redirect_uri = required("SPOTIFY_API_REDIRECT_URI");
        let sp_dc = required("SPOTIFY_SP_DC");
        let youtube_api_key = required("YOUTUBE_API_KEY");

        let address = get("SERVER_ADDRESS").unwrap_or_else(|| common::DEFAULT_SERVER_ADDRESS.into());
        let server_address = match address.parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(e) => {
                errors.invalid.push(format!("SERVER_ADDRESS={address}: {e}"));
                SocketAddr::from(([127, 0, 0, 1], 3012))
            }
        };

        let mut authorize_path =
            get("AUTHORIZE_PATH").unwrap_or_else(|| common::DEFAULT_AUTHORIZE_PATH.into());
        if !authorize_path.starts_with('/') {
            authorize_path.insert(0, '/');
        }
        if RESERVED_PATHS.contains(&authorize_path.as_str()) {
            errors
                .invalid
                .push(format!("AUTHORIZE_PATH={authorize_path}: route is already taken"));
        } else if authorize_path
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '*' | '?' | '#'))
        {
            errors.invalid.push(format!(
                "AUTHORIZE_PATH={authorize_path}: expected a plain path like /authorize"
            ));
        }

        let download_timeout = match get("DOWNLOAD_TIMEOUT_SECS") {
            None => Duration::from_secs(common::DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    errors
                        .invalid
                        .push(format!("DOWNLOAD_TIMEOUT_SECS={raw}: expected positive seconds"));
                    Duration::from_secs(common::DEFAULT_DOWNLOAD_TIMEOUT_SECS)
                }
            },
        };

        let lyrics_policy = match get("LYRICS_TOKEN_POLICY") {
            None => LyricsRefreshPolicy::default(),
            Some(raw) => match raw.parse::<LyricsRefreshPolicy>() {
                Ok(policy) => policy,
                Err(e) => {
                    errors.invalid.push(format!("LYRICS_TOKEN_POLICY={raw}: {e}"));
                    LyricsRefreshPolicy::default()
                }
            },
        };

        let defaults = Endpoints::default();
        let endpoints = Endpoints {
            spotify_auth_url: get("SPOTIFY_API_AUTH_URL").unwrap_or(defaults.spotify_auth_url),
            spotify_token_url: get("SPOTIFY_API_TOKEN_URL").unwrap_or(defaults.spotify_token_url),
            spotify_api_url: get("SPOTIFY_API_URL").unwrap_or(defaults.spotify_api_url),
            spotify_web_token_url: get("SPOTIFY_WEB_TOKEN_URL")
                .unwrap_or(defaults.spotify_web_token_url),
            spotify_lyrics_url: get("SPOTIFY_LYRICS_URL").unwrap_or(defaults.spotify_lyrics_url),
            youtube_api_url: get("YOUTUBE_API_URL").unwrap_or(defaults.youtube_api_url),
            youtube_watch_url: get("YOUTUBE_WATCH_URL").unwrap_or(defaults.youtube_watch_url),
        };

        let data_dir = get("NOWPLAYING_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(data_dir);
        let download_dir = get("DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);

        if !errors.missing.is_empty() || !errors.invalid.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            server_address,
            authorize_path,
            client_id,
            client_secret,
            redirect_uri,
            sp_dc,
            youtube_api_key,
            data_dir,
            download_dir,
            download_timeout,
            yt_dlp_path: get("YT_DLP_PATH").unwrap_or_else(|| common::DEFAULT_YT_DLP.into()),
            lyrics_policy,
            endpoints,
        })
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    pub fn oauth_token_path(&self) -> PathBuf {
        self.cache_dir().join(common::OAUTH_TOKEN_FILE)
    }

    pub fn lyrics_token_path(&self) -> PathBuf {
        self.cache_dir().join(common::LYRICS_TOKEN_FILE)
    }

    /// Address a local browser should use to reach the server.
    pub fn local_url(&self, path: &str) -> String {
        format!("http://{}{}", self.server_address, path)
    }
}
