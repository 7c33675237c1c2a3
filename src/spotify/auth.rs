use reqwest::{
    Client, StatusCode, Url,
    header::{CONTENT_TYPE, COOKIE, USER_AGENT},
};
use serde_json::Value;

use crate::{
    common,
    config::Settings,
    types::TokenResponse,
};

/// Builds the consent screen URL the operator is redirected to.
///
/// The URL carries the fixed scope set from [`common::SPOTIFY_SCOPES`], the
/// configured redirect URI and an opaque `state` value that the callback
/// checks before exchanging the code.
///
/// # Arguments
///
/// * `settings` - Runtime settings holding the client id, redirect URI and
///   authorization endpoint
/// * `state` - Random value echoed back by the provider on the callback
///
/// # Returns
///
/// The fully encoded URL, or an error string if the configured authorization
/// endpoint is not a valid URL.
///
/// # Example
///
/// ```
/// let url = authorize_url(&settings, "a1b2c3")?;
/// // https://accounts.spotify.com/authorize?client_id=...&response_type=code&...
/// ```
pub fn authorize_url(settings: &Settings, state: &str) -> Result<String, String> {
    let scope = common::SPOTIFY_SCOPES.join(" ");
    Url::parse_with_params(
        &settings.endpoints.spotify_auth_url,
        &[
            ("client_id", settings.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", settings.redirect_uri.as_str()),
            ("scope", scope.as_str()),
            ("state", state),
        ],
    )
    .map(String::from)
    .map_err(|e| e.to_string())
}

/// Exchanges an authorization code for the initial token pair.
///
/// Completes the authorization code flow started by the consent redirect.
/// The client authenticates with HTTP Basic using the configured client id
/// and secret.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `settings` - Runtime settings with credentials and the token endpoint
/// * `code` - Authorization code received on the callback
///
/// # Returns
///
/// Returns a `Result` containing:
/// - `Ok(TokenResponse)` - Access token, refresh token and lifetime
/// - `Err(reqwest::Error)` - Network error or non-success status
///
/// # Security Note
///
/// The authorization code is single-use and expires quickly. The exchange
/// should happen immediately after receiving the code.
pub async fn exchange_code(
    client: &Client,
    settings: &Settings,
    code: &str,
) -> Result<TokenResponse, reqwest::Error> {
    client
        .post(&settings.endpoints.spotify_token_url)
        .basic_auth(&settings.client_id, Some(&settings.client_secret))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", settings.redirect_uri.as_str()),
        ])
        .send()
        .await?
        .error_for_status()?
        .json::<TokenResponse>()
        .await
}

/// Exchanges a refresh token for a new access token.
///
/// The response may or may not carry a rotated refresh token; callers keep
/// the old one when it does not.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `settings` - Runtime settings with credentials and the token endpoint
/// * `refresh_token` - Refresh token from a previous grant
///
/// # Error Conditions
///
/// Common failures include:
/// - Network connectivity issues
/// - Invalid or revoked refresh token (400)
/// - Spotify accounts service errors
pub async fn refresh_grant(
    client: &Client,
    settings: &Settings,
    refresh_token: &str,
) -> Result<TokenResponse, reqwest::Error> {
    client
        .post(&settings.endpoints.spotify_token_url)
        .basic_auth(&settings.client_id, Some(&settings.client_secret))
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .send()
        .await?
        .error_for_status()?
        .json::<TokenResponse>()
        .await
}

/// Checks whether an access token still authenticates.
///
/// Calls the lightweight `GET /me` endpoint. Any non-success status means
/// the token is no longer usable.
pub async fn who_am_i(client: &Client, api_url: &str, token: &str) -> Result<bool, reqwest::Error> {
    let res = client
        .get(format!("{api_url}/me"))
        .bearer_auth(token)
        .send()
        .await?;

    Ok(res.status() == StatusCode::OK)
}

/// Fetches a web player token for the browser session identified by `sp_dc`.
///
/// The endpoint is not part of the public API. It is called with the same
/// headers a desktop browser would send and answers with a JSON document
/// containing `accessToken`, `accessTokenExpirationTimestampMs` and
/// `isAnonymous`. The body is returned untouched so it can be cached verbatim.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `token_url` - Token transport endpoint
/// * `sp_dc` - Value of the `sp_dc` session cookie
///
/// # Returns
///
/// Returns a `Result` containing:
/// - `Ok(Value)` - Raw token document
/// - `Err(reqwest::Error)` - Network error, non-success status or non-JSON body
pub async fn fetch_web_player_token(
    client: &Client,
    token_url: &str,
    sp_dc: &str,
) -> Result<Value, reqwest::Error> {
    client
        .get(token_url)
        .header(USER_AGENT, common::WEB_PLAYER_USER_AGENT)
        .header("App-platform", common::WEB_PLAYER_PLATFORM)
        .header(CONTENT_TYPE, "text/html; charset=utf-8")
        .header(COOKIE, format!("sp_dc={sp_dc};"))
        .send()
        .await?
        .error_for_status()?
        .json::<Value>()
        .await
}
