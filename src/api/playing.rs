use std::time::Instant;

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};

use crate::{
    api::ApiError,
    common,
    server::AppState,
    snapshot::{self, StageTimings},
    types::Message,
};

/// Playback snapshot with lyrics. Idle is a normal answer, not an error.
pub async fn currently_playing(State(state): State<AppState>) -> Result<Response, ApiError> {
    let started = Instant::now();

    let data_started = Instant::now();
    let Some(playback) = state.current_playback().await? else {
        return Ok(Json(Message {
            message: common::IDLE_MESSAGE.to_string(),
        })
        .into_response());
    };
    let data = data_started.elapsed();

    let lyrics_started = Instant::now();
    let lyrics = state.lyrics.fetch_lyrics(&playback.track_id).await;
    let lyrics_elapsed = lyrics_started.elapsed();

    let snapshot = snapshot::assemble(
        &playback,
        lyrics,
        StageTimings {
            data,
            lyrics: lyrics_elapsed,
            total: started.elapsed(),
        },
    );
    Ok(Json(snapshot).into_response())
}
