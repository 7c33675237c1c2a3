mod support;

use nowplaying::media::{MediaError, MediaResolver};
use reqwest::Client;
use serde_json::json;
use support::{Behaviour, Hits, Upstream};

#[tokio::test]
async fn test_resolve_first_video() {
    let upstream = Upstream::start(Behaviour {
        search_items: json!([
            { "id": { "kind": "youtube#channel", "channelId": "UC1" } },
            { "id": { "kind": "youtube#video", "videoId": "first" } },
            { "id": { "kind": "youtube#video", "videoId": "second" } }
        ]),
        ..Behaviour::default()
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let settings = upstream.settings(dir.path(), &[]);
    let resolver = MediaResolver::new(Client::new(), &settings);

    let id = resolver.resolve_video_id("Кукушка", "Кино").await.unwrap();
    assert_eq!(id, "first");

    let searches = upstream.searches();
    assert_eq!(searches[0]["q"], "Кукушка Кино");
    assert_eq!(searches[0]["type"], "video");
    assert_eq!(searches[0]["part"], "snippet");
    assert_eq!(searches[0]["key"], "yt-key");
}

#[tokio::test]
async fn test_resolve_without_results() {
    let upstream = Upstream::start(Behaviour::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let settings = upstream.settings(dir.path(), &[]);
    let resolver = MediaResolver::new(Client::new(), &settings);

    match resolver.resolve_video_id("Song", "Artist").await {
        Err(MediaError::NoResultsFound(query)) => assert_eq!(query, "Song Artist"),
        other => panic!("expected NoResultsFound, got {other:?}"),
    }
    assert_eq!(Hits::get(&upstream.hits.search), 1);
}

#[cfg(unix)]
mod extractor {
    use std::time::{Duration, Instant};

    use nowplaying::{
        config::Settings,
        media::{MediaAcquirer, MediaError},
    };
    use tokio_util::sync::CancellationToken;

    use super::support::{self, Behaviour, Upstream, files_in};

    async fn settings_with(dir: &std::path::Path, script: &str, timeout: &str) -> Settings {
        let upstream = Upstream::start(Behaviour::default()).await;
        let program = support::fake_extractor(dir, script);
        upstream.settings(
            dir,
            &[
                ("YT_DLP_PATH", program.to_str().unwrap()),
                ("DOWNLOAD_TIMEOUT_SECS", timeout),
            ],
        )
    }

    #[tokio::test]
    async fn test_successful_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with(
            dir.path(),
            r#"[ "$1" = "-x" ] && [ "$3" = "mp3" ] || exit 3
printf 'ID3 fake audio for %s' "$6" > "$5""#,
            "30",
        )
        .await;
        let acquirer = MediaAcquirer::new(&settings);

        let audio = acquirer.acquire("abc123").await.unwrap();
        let path = audio.path().to_path_buf();

        assert!(path.starts_with(&settings.download_dir));
        assert_eq!(path.extension().unwrap(), "mp3");
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "ID3 fake audio for https://video.example/watch?v=abc123"
        );

        drop(audio);
        assert!(!path.exists());
        assert!(files_in(&settings.download_dir).is_empty());
    }

    #[tokio::test]
    async fn test_two_requests_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with(dir.path(), r#"printf 'audio' > "$5""#, "30").await;
        let acquirer = MediaAcquirer::new(&settings);

        let (a, b) = tokio::join!(acquirer.acquire("one"), acquirer.acquire("two"));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.path(), b.path());
        assert_eq!(files_in(&settings.download_dir).len(), 2);

        drop(a);
        assert_eq!(files_in(&settings.download_dir).len(), 1);
        drop(b);
        assert!(files_in(&settings.download_dir).is_empty());
    }

    #[tokio::test]
    async fn test_failed_extraction_removes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with(
            dir.path(),
            r#"printf 'partial' > "$5.part"
echo "ERROR: Video unavailable" >&2
exit 1"#,
            "30",
        )
        .await;
        let acquirer = MediaAcquirer::new(&settings);

        match acquirer.acquire("gone").await {
            Err(MediaError::AcquisitionFailed(detail)) => {
                assert!(detail.contains("Video unavailable"), "{detail}")
            }
            other => panic!("expected AcquisitionFailed, got {other:?}"),
        }
        assert!(files_in(&settings.download_dir).is_empty());
    }

    #[tokio::test]
    async fn test_success_without_output_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with(dir.path(), "exit 0", "30").await;
        let acquirer = MediaAcquirer::new(&settings);

        assert!(matches!(
            acquirer.acquire("nothing").await,
            Err(MediaError::AcquisitionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_timeout_kills_extractor() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with(
            dir.path(),
            r#"printf 'partial' > "$5.part"
exec sleep 30"#,
            "1",
        )
        .await;
        let acquirer = MediaAcquirer::new(&settings);

        let started = Instant::now();
        let result = acquirer.acquire("slow").await;

        assert!(matches!(result, Err(MediaError::AcquisitionFailed(_))));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(files_in(&settings.download_dir).is_empty());
    }

    // Real extractors hand conversion to a child process (ffmpeg) that
    // would otherwise outlive them and write after cleanup.
    const CONVERTER_SCRIPT: &str = r#"(sleep 2; printf 'partial' > "$5.temp.mp3") >/dev/null 2>&1 &
sleep 30"#;

    #[tokio::test]
    async fn test_timeout_kills_converter_child() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with(dir.path(), CONVERTER_SCRIPT, "1").await;
        let acquirer = MediaAcquirer::new(&settings);

        let result = acquirer.acquire("slow").await;
        assert!(matches!(result, Err(MediaError::AcquisitionFailed(_))));
        assert!(files_in(&settings.download_dir).is_empty());

        // Past the point where the child would have written
        tokio::time::sleep(Duration::from_secs(3)).await;
        let leaked = files_in(&settings.download_dir);
        assert!(leaked.is_empty(), "leaked: {leaked:?}");
    }

    #[tokio::test]
    async fn test_cancellation_kills_converter_child() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with(dir.path(), CONVERTER_SCRIPT, "60").await;
        let acquirer = MediaAcquirer::new(&settings);

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        let result = acquirer.acquire_with_cancel("slow", &cancel).await;
        assert!(matches!(result, Err(MediaError::AcquisitionFailed(_))));

        tokio::time::sleep(Duration::from_secs(3)).await;
        let leaked = files_in(&settings.download_dir);
        assert!(leaked.is_empty(), "leaked: {leaked:?}");
    }

    #[tokio::test]
    async fn test_drop_removes_known_leftovers_only() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with(
            dir.path(),
            r#"printf 'audio' > "$5"
printf 'webm' > "${5%.mp3}.webm"
printf 'temp' > "$5.temp.mp3"
printf 'part' > "$5.part""#,
            "30",
        )
        .await;
        let acquirer = MediaAcquirer::new(&settings);

        let audio = acquirer.acquire("leftovers").await.unwrap();
        std::fs::write(settings.download_dir.join("unrelated.mp3"), "keep").unwrap();
        assert_eq!(files_in(&settings.download_dir).len(), 5);

        drop(audio);
        assert_eq!(
            files_in(&settings.download_dir),
            vec!["unrelated.mp3".to_string()]
        );
    }

    #[tokio::test]
    async fn test_cancellation_stops_extractor() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with(dir.path(), "exec sleep 30", "60").await;
        let acquirer = MediaAcquirer::new(&settings);

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let result = acquirer.acquire_with_cancel("slow", &cancel).await;

        assert!(matches!(result, Err(MediaError::AcquisitionFailed(_))));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(files_in(&settings.download_dir).is_empty());
    }

    #[tokio::test]
    async fn test_missing_extractor() {
        let dir = tempfile::tempdir().unwrap();
        let upstream = Upstream::start(Behaviour::default()).await;
        let settings = upstream.settings(
            dir.path(),
            &[("YT_DLP_PATH", "/nonexistent/yt-dlp-binary")],
        );

        match MediaAcquirer::new(&settings).acquire("x").await {
            Err(MediaError::AcquisitionFailed(detail)) => assert!(detail.contains("failed to run")),
            other => panic!("expected AcquisitionFailed, got {other:?}"),
        }
        assert!(files_in(&settings.download_dir).is_empty());
    }

    #[tokio::test]
    async fn test_keep_moves_file_out_of_download_dir() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with(dir.path(), r#"printf 'keep me' > "$5""#, "30").await;
        let acquirer = MediaAcquirer::new(&settings);

        let audio = acquirer.acquire("kept").await.unwrap();
        let dest = dir.path().join("Song-Artist.mp3");
        let saved = audio.keep(&dest).await.unwrap();

        assert_eq!(saved, dest);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "keep me");
        assert!(files_in(&settings.download_dir).is_empty());
    }
}
