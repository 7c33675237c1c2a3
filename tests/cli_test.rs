mod support;

use std::sync::{Arc, Mutex};

use nowplaying::{
    cli::save_current_song, config::Settings, management::TokenStore, server::AppState,
    types::OAuthTokenPair,
};
use serde_json::json;
use support::{Behaviour, Hits, Upstream, files_in};
use tokio_util::sync::CancellationToken;

async fn authorized_state(settings: Settings) -> AppState {
    TokenStore::new(settings.oauth_token_path())
        .persist(&OAuthTokenPair {
            access_token: "stored-access".into(),
            refresh_token: "stored-refresh".into(),
        })
        .await
        .unwrap();
    AppState::build(Arc::new(settings)).await.unwrap()
}

fn playing_with_video() -> Behaviour {
    Behaviour {
        player: Some(support::playing_track()),
        search_items: json!([{ "id": { "videoId": "vid42" } }]),
        ..Behaviour::default()
    }
}

#[tokio::test]
async fn test_unusable_output_fails_before_download() {
    let upstream = Upstream::start(playing_with_video()).await;
    let dir = tempfile::tempdir().unwrap();
    let settings = upstream.settings(dir.path(), &[]);
    let download_dir = settings.download_dir.clone();
    let state = authorized_state(settings).await;

    // A regular file where the output directory should be
    let output = dir.path().join("not-a-dir");
    std::fs::write(&output, "occupied").unwrap();

    let result = save_current_song(&state, &output, &CancellationToken::new(), |_| {}).await;

    assert!(result.is_err());
    assert_eq!(Hits::get(&upstream.hits.search), 0);
    assert!(files_in(&download_dir).is_empty());
}

#[tokio::test]
async fn test_idle_player_saves_nothing() {
    let upstream = Upstream::start(Behaviour::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let state = authorized_state(upstream.settings(dir.path(), &[])).await;
    let output = dir.path().join("music");

    let result = save_current_song(&state, &output, &CancellationToken::new(), |_| {}).await;

    assert!(matches!(result, Ok(None)));
    assert!(!output.exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_song_is_saved_under_readable_name() {
    let upstream = Upstream::start(playing_with_video()).await;
    let dir = tempfile::tempdir().unwrap();
    let program = support::fake_extractor(dir.path(), r#"printf 'ID3-audio' > "$5""#);
    let settings = upstream.settings(dir.path(), &[("YT_DLP_PATH", program.to_str().unwrap())]);
    let download_dir = settings.download_dir.clone();
    let state = authorized_state(settings).await;
    let output = dir.path().join("music");

    let messages = Mutex::new(Vec::new());
    let saved = save_current_song(&state, &output, &CancellationToken::new(), |msg| {
        messages.lock().unwrap().push(msg)
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(saved, output.join("Kukushka-Kino.mp3"));
    assert_eq!(std::fs::read_to_string(&saved).unwrap(), "ID3-audio");
    assert!(files_in(&download_dir).is_empty());
    assert_eq!(messages.lock().unwrap().len(), 2);
}
