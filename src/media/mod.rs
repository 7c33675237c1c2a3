//! # Media Module
//!
//! Turns "song + artist" into an audio file on disk:
//!
//! ```text
//! MediaResolver::resolve_video_id   video search API -> video id
//!          ↓
//! MediaAcquirer::acquire            yt-dlp -> TemporaryAudioFile
//!          ↓
//! TemporaryAudioFile::into_stream   response body, file removed on drop
//! ```
//!
//! A [`TemporaryAudioFile`] has exactly one owner. Whatever path the request
//! takes (finished stream, client disconnect, extractor failure, timeout) the
//! file and any partial output next to it are removed when that owner is
//! dropped.

mod acquirer;
mod resolver;

use std::{fmt, io};

pub use acquirer::{AudioStream, MediaAcquirer, TemporaryAudioFile};
pub use resolver::MediaResolver;

#[derive(Debug)]
pub enum MediaError {
    /// The search returned nothing for the query.
    NoResultsFound(String),
    /// The extractor could not be run, failed, timed out or produced nothing.
    AcquisitionFailed(String),
    Http(reqwest::Error),
    Io(io::Error),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::NoResultsFound(query) => write!(f, "no video found for '{query}'"),
            MediaError::AcquisitionFailed(detail) => write!(f, "audio extraction failed: {detail}"),
            MediaError::Http(e) => write!(f, "video search failed: {e}"),
            MediaError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for MediaError {}

impl From<reqwest::Error> for MediaError {
    fn from(err: reqwest::Error) -> Self {
        MediaError::Http(err)
    }
}

impl From<io::Error> for MediaError {
    fn from(err: io::Error) -> Self {
        MediaError::Io(err)
    }
}
