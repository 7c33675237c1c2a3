use reqwest::{Client, StatusCode};

use crate::types::{CurrentPlaybackResponse, PlaybackState};

/// Retrieves the current playback state of the account.
///
/// Calls `GET /me/player`. The endpoint answers `204 No Content` when no
/// device has anything loaded; that case, and anything that is not a track
/// (podcast episodes, ads), is reported as `None`. A paused track is still
/// returned, with `is_playing` set to `false`.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `api_url` - Base URL of the Web API
/// * `token` - Valid OAuth access token
///
/// # Returns
///
/// Returns a `Result` containing:
/// - `Ok(Some(PlaybackState))` - A track is loaded
/// - `Ok(None)` - Nothing is loaded
/// - `Err(reqwest::Error)` - Network error, API error or malformed body
///
/// # Example
///
/// ```
/// match get_playback_state(&client, "https://api.spotify.com/v1", &token).await? {
///     Some(state) if state.is_playing => println!("{} by {}", state.name, state.artist_line()),
///     _ => println!("idle"),
/// }
/// ```
pub async fn get_playback_state(
    client: &Client,
    api_url: &str,
    token: &str,
) -> Result<Option<PlaybackState>, reqwest::Error> {
    let res = client
        .get(format!("{api_url}/me/player"))
        .bearer_auth(token)
        .send()
        .await?
        .error_for_status()?;

    if res.status() == StatusCode::NO_CONTENT {
        return Ok(None);
    }

    let body = res.json::<CurrentPlaybackResponse>().await?;
    Ok(PlaybackState::from_response(body))
}
