use std::time::Instant;

use tabled::Table;

use crate::{
    cli::load_state,
    common, error, info,
    snapshot::{self, StageTimings},
    types::{LyricsTableRow, SnapshotTableRow},
    utils,
};

pub async fn now_playing(show_lyrics: bool) {
    let state = load_state().await;
    let started = Instant::now();

    let playback = match state.current_playback().await {
        Ok(Some(playback)) => playback,
        Ok(None) => {
            info!("{}", common::IDLE_MESSAGE);
            return;
        }
        Err(e) => error!("Cannot fetch playback state: {}", e),
    };
    let data = started.elapsed();

    let lyrics_started = Instant::now();
    let lyrics = state.lyrics.fetch_lyrics(&playback.track_id).await;
    let timings = StageTimings {
        data,
        lyrics: lyrics_started.elapsed(),
        total: started.elapsed(),
    };
    let snap = snapshot::assemble(&playback, lyrics, timings);

    let rows = vec![
        SnapshotTableRow {
            field: "Song".into(),
            value: snap.song.clone(),
        },
        SnapshotTableRow {
            field: "Artist".into(),
            value: snap.artist.clone(),
        },
        SnapshotTableRow {
            field: "Album".into(),
            value: snap.album.clone(),
        },
        SnapshotTableRow {
            field: "Position".into(),
            value: format!(
                "{} / {} ({}%)",
                utils::format_timestamp(snap.playback.progress_ms),
                utils::format_timestamp(snap.playback.duration_ms),
                snap.playback.progress_percentage
            ),
        },
        SnapshotTableRow {
            field: "Link".into(),
            value: snap.links.spotify.clone(),
        },
        SnapshotTableRow {
            field: "Timing".into(),
            value: format!(
                "data {}ms, lyrics {}ms, total {}ms",
                snap.timing.data_fetch_duration,
                snap.timing.lyrics_fetch_duration,
                snap.timing.total_duration
            ),
        },
    ];
    println!("{}", Table::new(rows));

    if !show_lyrics {
        return;
    }
    if snap.lyrics.lines.is_empty() {
        info!("No lyrics available for this track");
        return;
    }

    let lyrics_rows: Vec<LyricsTableRow> = snap
        .lyrics
        .lines
        .iter()
        .map(|line| LyricsTableRow {
            time: utils::format_timestamp(line.start_ms),
            line: line.text.clone(),
        })
        .collect();
    println!("{}", Table::new(lyrics_rows));
}
