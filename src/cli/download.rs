use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use crate::{api::ApiError, cli::load_state, common, error, info, server::AppState, success, utils};

/// Runs the media pipeline for the current track and keeps the result in
/// `output` (working directory by default).
pub async fn download(output: Option<PathBuf>) {
    let state = load_state().await;
    let output = output.unwrap_or_else(|| PathBuf::from("."));

    let pb = ProgressBar::new_spinner();
    pb.set_message("Checking playback...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );

    let cancel = state.shutdown.clone();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let result = save_current_song(&state, &output, &cancel, |msg| pb.set_message(msg)).await;
    pb.finish_and_clear();

    match result {
        Ok(Some(path)) => success!("Saved {}", path.display()),
        Ok(None) => info!("{}", common::IDLE_MESSAGE),
        Err(e) => error!("{}", e),
    }
}

/// Downloads the current track into `output` and returns the saved path, or
/// `None` when nothing is playing.
///
/// `output` is created before anything is fetched, so an unusable destination
/// fails without leaving audio in the download directory. `progress` receives
/// a short status line before each stage.
pub async fn save_current_song(
    state: &AppState,
    output: &Path,
    cancel: &CancellationToken,
    progress: impl Fn(String),
) -> Result<Option<PathBuf>, ApiError> {
    let Some(playback) = state.current_playback().await? else {
        return Ok(None);
    };
    let song = playback.name.clone();
    let artist = playback.artist_line();

    async_fs::create_dir_all(output).await?;

    progress(format!("Searching video for {} - {}...", song, artist));
    let video_id = state.resolver.resolve_video_id(&song, &artist).await?;

    progress(format!("Extracting audio from video {}...", video_id));
    let audio = state.acquirer.acquire_with_cancel(&video_id, cancel).await?;

    let dest = output.join(utils::local_filename(&song, &artist));
    let path = audio.keep(&dest).await?;
    Ok(Some(path))
}
