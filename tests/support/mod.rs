// Shared fixtures: an in-process stand-in for every remote service and a
// settings builder pointing at it. Not every test binary uses every helper.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use axum::{
    Form, Json, Router,
    extract::{Path as UrlPath, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use nowplaying::config::Settings;
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// How the fake services answer. Tests flip these between calls.
#[derive(Debug, Clone)]
pub struct Behaviour {
    /// Body of `GET /v1/me/player`; `None` answers 204.
    pub player: Option<Value>,
    /// Body of the lyrics endpoint; `None` answers 404.
    pub lyrics: Option<Value>,
    pub search_items: Value,
    pub me_ok: bool,
    pub token_ok: bool,
    /// Whether the token endpoint hands out a new refresh token.
    pub rotate_refresh: bool,
    pub web_token_expires_at_ms: i64,
    pub web_token_anonymous: bool,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            player: None,
            lyrics: None,
            search_items: json!([]),
            me_ok: true,
            token_ok: true,
            rotate_refresh: false,
            web_token_expires_at_ms: nowplaying::utils::now_ms() + 3_600_000,
            web_token_anonymous: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct Hits {
    pub token: AtomicUsize,
    pub me: AtomicUsize,
    pub player: AtomicUsize,
    pub web_token: AtomicUsize,
    pub lyrics: AtomicUsize,
    pub search: AtomicUsize,
}

impl Hits {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct Shared {
    behaviour: Arc<Mutex<Behaviour>>,
    hits: Arc<Hits>,
    grants: Arc<Mutex<Vec<HashMap<String, String>>>>,
    searches: Arc<Mutex<Vec<HashMap<String, String>>>>,
    cookies: Arc<Mutex<Vec<String>>>,
}

pub struct Upstream {
    pub addr: SocketAddr,
    pub hits: Arc<Hits>,
    behaviour: Arc<Mutex<Behaviour>>,
    grants: Arc<Mutex<Vec<HashMap<String, String>>>>,
    searches: Arc<Mutex<Vec<HashMap<String, String>>>>,
    cookies: Arc<Mutex<Vec<String>>>,
}

impl Upstream {
    pub async fn start(behaviour: Behaviour) -> Self {
        let shared = Shared {
            behaviour: Arc::new(Mutex::new(behaviour)),
            hits: Arc::new(Hits::default()),
            grants: Arc::new(Mutex::new(Vec::new())),
            searches: Arc::new(Mutex::new(Vec::new())),
            cookies: Arc::new(Mutex::new(Vec::new())),
        };

        let app = Router::new()
            .route("/api/token", post(token))
            .route("/v1/me", get(me))
            .route("/v1/me/player", get(player))
            .route("/web-token", get(web_token))
            .route("/lyrics/{id}", get(lyrics))
            .route("/search", get(search))
            .with_state(shared.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            hits: shared.hits,
            behaviour: shared.behaviour,
            grants: shared.grants,
            searches: shared.searches,
            cookies: shared.cookies,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn set(&self, update: impl FnOnce(&mut Behaviour)) {
        update(&mut self.behaviour.lock().unwrap());
    }

    pub fn grants(&self) -> Vec<HashMap<String, String>> {
        self.grants.lock().unwrap().clone()
    }

    pub fn searches(&self) -> Vec<HashMap<String, String>> {
        self.searches.lock().unwrap().clone()
    }

    pub fn cookies(&self) -> Vec<String> {
        self.cookies.lock().unwrap().clone()
    }

    /// Settings for a backend talking only to this fake, keeping its files
    /// under `dir`.
    pub fn settings(&self, dir: &Path, extra: &[(&str, &str)]) -> Settings {
        let mut vars: HashMap<String, String> = HashMap::new();
        let mut put = |k: &str, v: String| {
            vars.insert(k.to_string(), v);
        };
        put("SPOTIFY_API_AUTH_CLIENT_ID", "client-id".into());
        put("SPOTIFY_API_AUTH_CLIENT_SECRET", "client-secret".into());
        put("SPOTIFY_API_REDIRECT_URI", "http://127.0.0.1:3012/callback".into());
        put("SPOTIFY_SP_DC", "cookie-value".into());
        put("YOUTUBE_API_KEY", "yt-key".into());
        put("SPOTIFY_API_AUTH_URL", self.url("/authorize"));
        put("SPOTIFY_API_TOKEN_URL", self.url("/api/token"));
        put("SPOTIFY_API_URL", self.url("/v1"));
        put("SPOTIFY_WEB_TOKEN_URL", self.url("/web-token"));
        put("SPOTIFY_LYRICS_URL", self.url("/lyrics"));
        put("YOUTUBE_API_URL", self.url("/search"));
        put("YOUTUBE_WATCH_URL", "https://video.example/watch".into());
        put("NOWPLAYING_DATA_DIR", dir.join("data").display().to_string());
        put("DOWNLOAD_DIR", dir.join("downloads").display().to_string());
        for (k, v) in extra {
            put(k, v.to_string());
        }

        Settings::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }
}

async fn token(State(shared): State<Shared>, Form(form): Form<HashMap<String, String>>) -> Response {
    let n = shared.hits.token.fetch_add(1, Ordering::SeqCst) + 1;
    shared.grants.lock().unwrap().push(form.clone());
    let behaviour = shared.behaviour.lock().unwrap().clone();

    if !behaviour.token_ok {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_grant" }))).into_response();
    }

    let mut body = json!({
        "access_token": format!("access-{n}"),
        "token_type": "Bearer",
        "expires_in": 3600,
        "scope": "user-read-playback-state user-read-currently-playing",
    });
    if form.get("grant_type").map(String::as_str) == Some("authorization_code")
        || behaviour.rotate_refresh
    {
        body["refresh_token"] = json!(format!("refresh-{n}"));
    }
    Json(body).into_response()
}

async fn me(State(shared): State<Shared>) -> Response {
    shared.hits.me.fetch_add(1, Ordering::SeqCst);
    if shared.behaviour.lock().unwrap().me_ok {
        Json(json!({ "id": "listener" })).into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn player(State(shared): State<Shared>) -> Response {
    shared.hits.player.fetch_add(1, Ordering::SeqCst);
    match shared.behaviour.lock().unwrap().player.clone() {
        Some(body) => Json(body).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn web_token(State(shared): State<Shared>, headers: axum::http::HeaderMap) -> Response {
    shared.hits.web_token.fetch_add(1, Ordering::SeqCst);
    if let Some(cookie) = headers.get("cookie").and_then(|v| v.to_str().ok()) {
        shared.cookies.lock().unwrap().push(cookie.to_string());
    }
    let behaviour = shared.behaviour.lock().unwrap().clone();
    Json(json!({
        "clientId": "web-player",
        "accessToken": "web-token",
        "accessTokenExpirationTimestampMs": behaviour.web_token_expires_at_ms,
        "isAnonymous": behaviour.web_token_anonymous,
    }))
    .into_response()
}

async fn lyrics(State(shared): State<Shared>, UrlPath(_id): UrlPath<String>) -> Response {
    shared.hits.lyrics.fetch_add(1, Ordering::SeqCst);
    match shared.behaviour.lock().unwrap().lyrics.clone() {
        Some(body) => Json(body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn search(
    State(shared): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    shared.hits.search.fetch_add(1, Ordering::SeqCst);
    shared.searches.lock().unwrap().push(query);
    let items = shared.behaviour.lock().unwrap().search_items.clone();
    Json(json!({ "kind": "youtube#searchListResponse", "items": items })).into_response()
}

/// A track in progress: 30s into a two minute song.
pub fn playing_track() -> Value {
    json!({
        "is_playing": true,
        "progress_ms": 30000,
        "item": {
            "id": "4uLU6hMCjMI75M1A2tKUQC",
            "name": "Кукушка",
            "type": "track",
            "duration_ms": 120000,
            "artists": [{ "name": "Кино" }],
            "album": {
                "name": "Чёрный альбом",
                "images": [
                    { "url": "https://img.example/640.jpg", "width": 640, "height": 640 },
                    { "url": "https://img.example/64.jpg", "width": 64, "height": 64 }
                ]
            },
            "external_urls": { "spotify": "https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC" }
        }
    })
}

pub fn synced_lyrics() -> Value {
    json!({
        "lyrics": {
            "syncType": "LINE_SYNCED",
            "lines": [
                { "startTimeMs": "1000", "words": "first line", "syllables": [], "endTimeMs": "0" },
                { "startTimeMs": "4500", "words": "second line", "syllables": [], "endTimeMs": "0" }
            ]
        },
        "colors": { "background": -1 },
        "hasVocalRemoval": false
    })
}

/// Writes an executable shell script standing in for the extractor. It is
/// called as `<script> -x --audio-format mp3 -o <output> <url>`.
#[cfg(unix)]
pub fn fake_extractor(dir: &Path, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-yt-dlp.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Files currently in `dir`; a missing directory counts as empty.
pub fn files_in(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Polls `check` for up to two seconds.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..40 {
        if check() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    check()
}
