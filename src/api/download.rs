use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{api::ApiError, info, server::AppState, utils};

pub const SONG_NAME_HEADER: HeaderName = HeaderName::from_static("x-song-name");
pub const ARTIST_NAME_HEADER: HeaderName = HeaderName::from_static("x-artist-name");

/// Extracts the current track as MP3 and streams it back.
///
/// The temporary file lives inside the response body and is removed once the
/// body has been sent or abandoned.
pub async fn download_current_song(State(state): State<AppState>) -> Result<Response, ApiError> {
    let Some(playback) = state.current_playback().await? else {
        return Err(ApiError::NotPlaying);
    };
    let song = playback.name.clone();
    let artist = playback.artist_line();

    let video_id = state.resolver.resolve_video_id(&song, &artist).await?;
    let cancel = state.shutdown.child_token();
    let audio = state.acquirer.acquire_with_cancel(&video_id, &cancel).await?;

    let size = async_fs::metadata(audio.path()).await?.len();
    let stream = audio.into_stream().await?;

    let headers = download_headers(&song, &artist, size)?;
    info!("Sending {} - {} ({} bytes)", song, artist, size);
    Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
}

fn download_headers(song: &str, artist: &str, size: u64) -> Result<HeaderMap, ApiError> {
    let value = |s: String| HeaderValue::from_str(&s).map_err(|e| ApiError::Internal(e.to_string()));

    let filename = utils::download_filename(song, artist);
    let ascii_name = utils::sanitize_header_value(&filename).replace('"', "'");
    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_name,
        utils::percent_encode(&filename)
    );

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    headers.insert(header::CONTENT_DISPOSITION, value(disposition)?);
    headers.insert(SONG_NAME_HEADER, value(utils::sanitize_header_value(song))?);
    headers.insert(ARTIST_NAME_HEADER, value(utils::sanitize_header_value(artist))?);
    Ok(headers)
}
