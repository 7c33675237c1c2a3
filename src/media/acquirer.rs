use std::{
    io,
    path::{Path, PathBuf},
    pin::Pin,
    process::Stdio,
    task::{Context, Poll},
    time::Duration,
};

use axum::body::Bytes;
use futures_util::Stream;
use tokio::process::Command;
use tokio_util::{io::ReaderStream, sync::CancellationToken};

use crate::{config::Settings, info, media::MediaError, utils, warning};

/// Intermediate files the extractor appends to the `-o` target name.
const LEFTOVER_SUFFIXES: [&str; 3] = [".part", ".ytdl", ".temp.mp3"];
/// Pre-conversion downloads that reuse the target's stem.
const LEFTOVER_EXTENSIONS: [&str; 6] = ["webm", "m4a", "opus", "webm.part", "m4a.part", "temp.mp3"];

/// An audio file owned by a single request.
///
/// Dropping it removes the file together with any extractor leftovers that
/// share its random stem (`<stem>.webm`, `<stem>.mp3.part`, ...).
#[derive(Debug)]
pub struct TemporaryAudioFile {
    path: PathBuf,
    armed: bool,
}

impl TemporaryAudioFile {
    fn allocate(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{}.mp3", utils::random_file_stem())),
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Streams the file; the file is removed once the stream is dropped.
    pub async fn into_stream(self) -> io::Result<AudioStream> {
        let file = tokio::fs::File::open(&self.path).await?;
        Ok(AudioStream {
            inner: ReaderStream::new(file),
            _file: self,
        })
    }

    /// Moves the file to `dest` and gives up ownership of it.
    pub async fn keep(mut self, dest: &Path) -> io::Result<PathBuf> {
        if async_fs::rename(&self.path, dest).await.is_err() {
            // Different filesystem; copy, the original goes away on drop.
            async_fs::copy(&self.path, dest).await?;
            return Ok(dest.to_path_buf());
        }
        self.armed = false;
        self.remove_leftovers();
        Ok(dest.to_path_buf())
    }

    fn remove_leftovers(&self) {
        let suffixed = LEFTOVER_SUFFIXES.iter().map(|suffix| {
            let mut name = self.path.clone().into_os_string();
            name.push(suffix);
            PathBuf::from(name)
        });
        let renamed = LEFTOVER_EXTENSIONS
            .iter()
            .map(|ext| self.path.with_extension(ext));

        for path in suffixed.chain(renamed) {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warning!("Error deleting {}: {}", path.display(), e),
            }
        }
    }
}

impl Drop for TemporaryAudioFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warning!("Error deleting {}: {}", self.path.display(), e),
        }
        self.remove_leftovers();
    }
}

/// Response body over a [`TemporaryAudioFile`].
pub struct AudioStream {
    inner: ReaderStream<tokio::fs::File>,
    _file: TemporaryAudioFile,
}

impl Stream for AudioStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

/// The extractor's process group. Dropping it kills whatever is still running
/// in the group, including converters the extractor started itself.
struct ProcessGroup {
    leader: Option<u32>,
}

impl ProcessGroup {
    /// Leaves the group alone on drop.
    fn release(&mut self) {
        self.leader = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        let Some(leader) = self.leader.take() else {
            return;
        };

        #[cfg(unix)]
        {
            use nix::{
                errno::Errno,
                sys::signal::{Signal, killpg},
                unistd::Pid,
            };

            let Ok(pgid) = i32::try_from(leader) else {
                return;
            };
            match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(e) => warning!("Cannot stop extractor process group {}: {}", pgid, e),
            }
        }

        #[cfg(not(unix))]
        let _ = leader;
    }
}

/// Runs the external extractor against a video.
pub struct MediaAcquirer {
    program: String,
    watch_url: String,
    download_dir: PathBuf,
    timeout: Duration,
}

impl MediaAcquirer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            program: settings.yt_dlp_path.clone(),
            watch_url: settings.endpoints.youtube_watch_url.clone(),
            download_dir: settings.download_dir.clone(),
            timeout: settings.download_timeout,
        }
    }

    pub async fn acquire(&self, video_id: &str) -> Result<TemporaryAudioFile, MediaError> {
        self.acquire_with_cancel(video_id, &CancellationToken::new())
            .await
    }

    /// Extracts the audio of `video_id` into a fresh temporary file.
    ///
    /// Returns once the extractor has exited. On failure, timeout or
    /// cancellation its whole process group is killed first, then everything
    /// it wrote is removed.
    pub async fn acquire_with_cancel(
        &self,
        video_id: &str,
        cancel: &CancellationToken,
    ) -> Result<TemporaryAudioFile, MediaError> {
        async_fs::create_dir_all(&self.download_dir).await?;
        let file = TemporaryAudioFile::allocate(&self.download_dir);
        let video_url = format!("{}?v={}", self.watch_url, video_id);

        info!("Starting download: {}", video_url);
        info!("Saving to: {}", file.path().display());

        let mut command = Command::new(&self.program);
        command
            .args(["-x", "--audio-format", "mp3", "-o"])
            .arg(file.path())
            .arg(&video_url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|e| {
            MediaError::AcquisitionFailed(format!("failed to run {}: {}", self.program, e))
        })?;
        // Declared after `file`: on early return the group dies before the
        // file is removed.
        let mut group = ProcessGroup {
            leader: child.id(),
        };

        let output = tokio::select! {
            res = tokio::time::timeout(self.timeout, child.wait_with_output()) => match res {
                Ok(Ok(output)) => output,
                Ok(Err(e)) => {
                    return Err(MediaError::AcquisitionFailed(format!(
                        "waiting for {} failed: {}",
                        self.program, e
                    )));
                }
                Err(_) => {
                    return Err(MediaError::AcquisitionFailed(format!(
                        "{} did not finish within {}s",
                        self.program,
                        self.timeout.as_secs()
                    )));
                }
            },
            _ = cancel.cancelled() => {
                return Err(MediaError::AcquisitionFailed("download cancelled".into()));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = [stderr.trim(), stdout.trim()]
                .into_iter()
                .find(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| output.status.to_string());
            return Err(MediaError::AcquisitionFailed(detail));
        }

        match async_fs::metadata(file.path()).await {
            Ok(meta) if meta.is_file() => {}
            _ => {
                return Err(MediaError::AcquisitionFailed(format!(
                    "{} exited successfully but wrote no file",
                    self.program
                )));
            }
        }

        group.release();
        info!("Download complete: {}", video_id);
        Ok(file)
    }
}
