//! Fixed values shared across the crate: provider endpoints, scopes, header
//! values, file names and timer periods. Every URL here can be overridden
//! through [`crate::config::Settings`].

use std::time::Duration;

pub const APP_DIR: &str = "nowplaying";

pub const SPOTIFY_API_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const SPOTIFY_API_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
pub const SPOTIFY_WEB_TOKEN_URL: &str =
    "https://open.spotify.com/get_access_token?reason=transport&productType=web_player";
pub const SPOTIFY_LYRICS_URL: &str = "https://spclient.wg.spotify.com/color-lyrics/v2/track";

pub const YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3/search";
pub const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch";

/// Scopes requested on the consent screen.
pub const SPOTIFY_SCOPES: [&str; 2] = ["user-read-playback-state", "user-read-currently-playing"];

/// The web player endpoints reject requests that do not look like a browser.
pub const WEB_PLAYER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/101.0.0.0 Safari/537.36";
pub const WEB_PLAYER_PLATFORM: &str = "WebPlayer";

pub const OAUTH_TOKEN_FILE: &str = "spotify-tokens.json";
pub const LYRICS_TOKEN_FILE: &str = "lyrics-token.json";

/// Access tokens live for 60 minutes; the keep-alive runs a little earlier.
pub const OAUTH_REFRESH_PERIOD: Duration = Duration::from_secs(55 * 60);
/// Subtracted from the advertised token lifetime.
pub const OAUTH_EXPIRY_MARGIN_MS: i64 = 60_000;
/// How long a successful "who am I" check is trusted when the expiry is unknown.
pub const OAUTH_CHECK_TTL_MS: i64 = 5 * 60_000;

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:3012";
pub const DEFAULT_AUTHORIZE_PATH: &str = "/authorize";
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_YT_DLP: &str = "yt-dlp";

pub const IDLE_MESSAGE: &str = "No song is currently playing";
