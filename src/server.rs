use std::{collections::VecDeque, sync::Arc};

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use reqwest::Client;
use tokio::{net::TcpListener, sync::Mutex};
use tokio_util::sync::CancellationToken;

use crate::{
    api,
    config::Settings,
    management::{LyricsAuthManager, PlaybackAuthManager, TokenError},
    media::{MediaAcquirer, MediaResolver},
    spotify::{self, LyricsClient},
    types::PlaybackState,
};

/// Consent `state` values kept around for the callback.
const MAX_PENDING_STATES: usize = 16;

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub client: Client,
    pub playback_auth: Arc<PlaybackAuthManager>,
    pub lyrics: Arc<LyricsClient>,
    pub resolver: Arc<MediaResolver>,
    pub acquirer: Arc<MediaAcquirer>,
    pub pending_states: Arc<Mutex<VecDeque<String>>>,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub async fn build(settings: Arc<Settings>) -> Result<Self, TokenError> {
        let client = Client::new();
        let playback_auth =
            Arc::new(PlaybackAuthManager::load(client.clone(), Arc::clone(&settings)).await?);
        let lyrics = Arc::new(LyricsClient::new(
            client.clone(),
            settings.endpoints.spotify_lyrics_url.clone(),
            Arc::new(LyricsAuthManager::new(client.clone(), &settings)),
        ));

        Ok(Self {
            resolver: Arc::new(MediaResolver::new(client.clone(), &settings)),
            acquirer: Arc::new(MediaAcquirer::new(&settings)),
            settings,
            client,
            playback_auth,
            lyrics,
            pending_states: Arc::new(Mutex::new(VecDeque::new())),
            shutdown: CancellationToken::new(),
        })
    }

    /// Current playback, or `None` when nothing is actively playing.
    pub async fn current_playback(&self) -> Result<Option<PlaybackState>, api::ApiError> {
        let token = self.playback_auth.ensure_valid().await?;
        let state = spotify::player::get_playback_state(
            &self.client,
            &self.settings.endpoints.spotify_api_url,
            &token,
        )
        .await?;
        Ok(state.filter(|s| s.is_playing))
    }

    pub async fn remember_state(&self, value: String) {
        let mut pending = self.pending_states.lock().await;
        if pending.len() >= MAX_PENDING_STATES {
            pending.pop_front();
        }
        pending.push_back(value);
    }

    /// Consumes a `state` issued by [`remember_state`](Self::remember_state).
    pub async fn take_state(&self, value: &str) -> bool {
        let mut pending = self.pending_states.lock().await;
        match pending.iter().position(|s| s == value) {
            Some(index) => {
                pending.remove(index);
                true
            }
            None => false,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let authorize_path = state.settings.authorize_path.clone();

    Router::new()
        .route("/", get(api::index))
        .route("/health", get(api::health))
        .route("/currently-playing", get(api::currently_playing))
        .route("/download-current-song", get(api::download_current_song))
        .route(&authorize_path, get(api::authorize))
        .route("/callback", get(api::callback))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

// The UI runs on another origin and reads the download headers. Preflights
// never reach the handlers.
async fn cors(request: Request, next: Next) -> Response {
    let preflight = request.method() == Method::OPTIONS;
    let requested_headers = request
        .headers()
        .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .cloned();

    let mut response = if preflight {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static("X-Song-Name, X-Artist-Name, Content-Disposition"),
    );
    if preflight {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, HEAD, OPTIONS"),
        );
        if let Some(requested) = requested_headers {
            headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, requested);
        }
    }
    response
}

/// Serves the API until `state.shutdown` is cancelled.
pub async fn start_api_server(state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(state.settings.server_address).await?;
    serve(listener, state).await
}

pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let shutdown = state.shutdown.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}
