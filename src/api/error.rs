use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{common, management::TokenError, media::MediaError, warning};

/// Failure of a request, rendered as `{message, detail?}`.
#[derive(Debug)]
pub enum ApiError {
    /// Nothing is playing; only an error for the download endpoint.
    NotPlaying,
    BadRequest(String),
    /// Could not get a usable playback token.
    Token(TokenError),
    /// The authorization code could not be exchanged.
    Exchange(TokenError),
    Playback(reqwest::Error),
    Media(MediaError),
    Internal(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NotPlaying => write!(f, "{}", common::IDLE_MESSAGE),
            ApiError::BadRequest(msg) => write!(f, "{msg}"),
            ApiError::Token(e) => write!(f, "{e}"),
            ApiError::Exchange(e) => write!(f, "token exchange failed: {e}"),
            ApiError::Playback(e) => write!(f, "failed to fetch playback state: {e}"),
            ApiError::Media(e) => write!(f, "{e}"),
            ApiError::Internal(detail) => write!(f, "{detail}"),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::Token(err)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Playback(err)
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        ApiError::Media(err)
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, detail) = match self {
            ApiError::NotPlaying => (StatusCode::NOT_FOUND, common::IDLE_MESSAGE.to_string(), None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Token(TokenError::AuthUnavailable) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Not authorized with Spotify, complete the authorization flow first".to_string(),
                None,
            ),
            ApiError::Token(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not obtain a Spotify access token".to_string(),
                Some(e.to_string()),
            ),
            ApiError::Exchange(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Token exchange failed".to_string(),
                Some(e.to_string()),
            ),
            ApiError::Playback(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch playback state".to_string(),
                Some(e.to_string()),
            ),
            ApiError::Media(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to download the song.".to_string(),
                Some(e.to_string()),
            ),
            ApiError::Internal(detail) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
                Some(detail),
            ),
        };

        if status.is_server_error() {
            warning!("{}: {}", message, detail.as_deref().unwrap_or("-"));
        }

        let body = match detail {
            Some(detail) => json!({ "message": message, "detail": detail }),
            None => json!({ "message": message }),
        };
        (status, Json(body)).into_response()
    }
}
