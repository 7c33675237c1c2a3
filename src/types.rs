use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tabled::Tabled;

/// Credential pair of the public playback API. Exactly these two fields are
/// written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthTokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Body of an `authorization_code` or `refresh_token` grant.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Typed view of the cookie-derived web player token. The cache file keeps the
/// provider's raw JSON; this is parsed from it on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieToken {
    pub access_token: String,
    pub expires_at_ms: i64,
    pub is_anonymous: bool,
}

impl CookieToken {
    pub fn from_value(value: &Value) -> Option<Self> {
        let access_token = value.get("accessToken")?.as_str()?.to_string();
        Some(Self {
            access_token,
            expires_at_ms: value
                .get("accessTokenExpirationTimestampMs")
                .and_then(Value::as_i64)
                .unwrap_or_default(),
            is_anonymous: value
                .get("isAnonymous")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at_ms <= now_ms
    }
}

/// Response of `GET /me/player`.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentPlaybackResponse {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    #[serde(default)]
    pub item: Option<PlaybackItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackItem {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub album: Option<AlbumRef>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumRef {
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: String,
}

/// What is playing right now. Fetched fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    pub track_id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
    pub duration_ms: u64,
    pub progress_ms: u64,
    pub cover_image_url: String,
    pub external_url: String,
    pub is_playing: bool,
}

impl PlaybackState {
    /// Returns `None` unless the loaded item is a track.
    pub fn from_response(response: CurrentPlaybackResponse) -> Option<Self> {
        let item = response.item?;
        if !item.kind.is_empty() && item.kind != "track" {
            return None;
        }
        let track_id = item.id?;
        let album = item.album?;

        Some(Self {
            track_id,
            name: item.name,
            artists: item.artists.into_iter().map(|a| a.name).collect(),
            cover_image_url: album
                .images
                .first()
                .map(|i| i.url.clone())
                .unwrap_or_default(),
            album: album.name,
            duration_ms: item.duration_ms,
            progress_ms: response.progress_ms.unwrap_or_default(),
            external_url: item.external_urls.spotify,
            is_playing: response.is_playing,
        })
    }

    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncType {
    #[serde(rename = "LINE_SYNCED")]
    LineSynced,
    #[serde(rename = "LINE_UNSYNCED")]
    LineUnsynced,
}

/// Lyrics as handed to the UI. Field names follow the provider's format so the
/// consumer can render either source the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsDocument {
    pub sync_type: SyncType,
    pub lines: Vec<LyricsLine>,
}

impl LyricsDocument {
    /// The "no lyrics" value, shaped like any other document.
    pub fn empty() -> Self {
        Self {
            sync_type: SyncType::LineUnsynced,
            lines: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LyricsLine {
    #[serde(rename = "words")]
    pub text: String,
    #[serde(rename = "startTimeMs", serialize_with = "ms_as_string")]
    pub start_ms: u64,
    #[serde(rename = "endTimeMs", serialize_with = "ms_as_string")]
    pub end_ms: u64,
}

fn ms_as_string<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Response of the internal color-lyrics endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LyricsResponse {
    pub lyrics: RawLyrics,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLyrics {
    #[serde(default)]
    pub sync_type: String,
    #[serde(default)]
    pub lines: Vec<RawLyricsLine>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLyricsLine {
    #[serde(default)]
    pub words: String,
    #[serde(default)]
    pub start_time_ms: Option<Value>,
    #[serde(default)]
    pub end_time_ms: Option<Value>,
}

// Timestamps arrive as decimal strings, occasionally as numbers.
fn ms_from_value(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        Some(Value::Number(n)) => n.as_u64().unwrap_or_default(),
        _ => 0,
    }
}

impl From<RawLyrics> for LyricsDocument {
    fn from(raw: RawLyrics) -> Self {
        let sync_type = match raw.sync_type.as_str() {
            "LINE_UNSYNCED" | "UNSYNCED" => SyncType::LineUnsynced,
            _ => SyncType::LineSynced,
        };

        Self {
            sync_type,
            lines: raw
                .lines
                .into_iter()
                .map(|line| LyricsLine {
                    start_ms: ms_from_value(line.start_time_ms.as_ref()),
                    end_ms: ms_from_value(line.end_time_ms.as_ref()),
                    text: line.words,
                })
                .collect(),
        }
    }
}

/// Response of the video search API.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoSearchResponse {
    #[serde(default)]
    pub items: Vec<VideoSearchItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoSearchItem {
    pub id: VideoSearchId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoSearchId {
    #[serde(rename = "videoId", default)]
    pub video_id: Option<String>,
}

/// Payload of `GET /currently-playing`.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub song: String,
    pub artist: String,
    pub album: String,
    pub song_image: String,
    pub delay: Delay,
    pub playback: PlaybackProgress,
    pub links: Links,
    pub lyrics: LyricsDocument,
    pub timing: Timing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Delay {
    pub data: u64,
    pub lyrics: u64,
    pub external_lyrics: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaybackProgress {
    pub progress_ms: u64,
    pub duration_ms: u64,
    pub progress_percentage: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Links {
    pub genius: String,
    pub spotify: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timing {
    pub data_fetch_duration: u64,
    pub genius_fetch_duration: u64,
    pub lyrics_fetch_duration: u64,
    pub total_duration: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[derive(Tabled)]
pub struct SnapshotTableRow {
    pub field: String,
    pub value: String,
}

#[derive(Tabled)]
pub struct LyricsTableRow {
    pub time: String,
    pub line: String,
}
