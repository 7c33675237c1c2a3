use std::time::Duration;

use crate::{
    types::{Delay, Links, LyricsDocument, PlaybackProgress, PlaybackState, Snapshot, Timing},
    utils,
};

/// Wall-clock time spent in each stage of a snapshot request.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageTimings {
    pub data: Duration,
    pub lyrics: Duration,
    pub total: Duration,
}

/// Combines playback state and lyrics into the `/currently-playing` payload.
///
/// The secondary lyrics source fields are kept for the UI and stay empty.
pub fn assemble(state: &PlaybackState, lyrics: LyricsDocument, timings: StageTimings) -> Snapshot {
    let data = millis(timings.data);
    let lyrics_ms = millis(timings.lyrics);
    let total = millis(timings.total);

    Snapshot {
        song: state.name.clone(),
        artist: state.artist_line(),
        album: state.album.clone(),
        song_image: state.cover_image_url.clone(),
        delay: Delay {
            data,
            lyrics: lyrics_ms,
            external_lyrics: 0,
            total,
        },
        playback: PlaybackProgress {
            progress_ms: state.progress_ms,
            duration_ms: state.duration_ms,
            progress_percentage: utils::progress_percentage(state.progress_ms, state.duration_ms),
        },
        links: Links {
            genius: String::new(),
            spotify: state.external_url.clone(),
        },
        lyrics,
        timing: Timing {
            data_fetch_duration: data,
            genius_fetch_duration: 0,
            lyrics_fetch_duration: lyrics_ms,
            total_duration: total,
        },
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
