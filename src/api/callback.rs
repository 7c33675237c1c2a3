use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use crate::{api::ApiError, server::AppState, success, utils};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Redirects the operator to the consent screen.
pub async fn authorize(State(state): State<AppState>) -> Result<Response, ApiError> {
    let nonce = utils::generate_state();
    let url = state
        .playback_auth
        .authorize_url(&nonce)
        .map_err(ApiError::Internal)?;
    state.remember_state(nonce).await;
    Ok(found(&url))
}

/// Completes the consent flow: exchanges the code and persists the pair.
pub async fn callback(
    Query(params): Query<CallbackParams>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    if let Some(error) = params.error {
        return Err(ApiError::BadRequest(format!("Authorization denied: {error}")));
    }
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return Err(ApiError::BadRequest("Missing authorization code".into()));
    };
    if let Some(nonce) = params.state {
        if !state.take_state(&nonce).await {
            return Err(ApiError::BadRequest("Unknown authorization state".into()));
        }
    }

    state
        .playback_auth
        .exchange_code(&code)
        .await
        .map_err(ApiError::Exchange)?;

    success!("Authorization complete, tokens saved");
    Ok(found("/"))
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    if state.playback_auth.is_authorized().await {
        Html("<h2>Authorized.</h2><p>The companion UI can connect now.</p>".to_string())
    } else {
        Html(format!(
            "<h2>Not authorized.</h2><p><a href=\"{}\">Connect a Spotify account</a></p>",
            state.settings.authorize_path
        ))
    }
}
