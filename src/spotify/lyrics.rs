use std::{fmt, sync::Arc};

use reqwest::{Client, header::USER_AGENT};

use crate::{
    common,
    management::{LyricsAuthManager, TokenError},
    types::{LyricsDocument, LyricsResponse},
    warning,
};

/// Why a track ended up without lyrics.
#[derive(Debug)]
pub enum LyricsUnavailable {
    Token(TokenError),
    Http(reqwest::Error),
}

impl fmt::Display for LyricsUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LyricsUnavailable::Token(e) => write!(f, "no usable web player token: {e}"),
            LyricsUnavailable::Http(e) => write!(f, "lyrics request failed: {e}"),
        }
    }
}

impl std::error::Error for LyricsUnavailable {}

impl From<TokenError> for LyricsUnavailable {
    fn from(err: TokenError) -> Self {
        LyricsUnavailable::Token(err)
    }
}

impl From<reqwest::Error> for LyricsUnavailable {
    fn from(err: reqwest::Error) -> Self {
        LyricsUnavailable::Http(err)
    }
}

/// Reads time-synced lyrics from the internal color-lyrics endpoint.
pub struct LyricsClient {
    client: Client,
    lyrics_url: String,
    auth: Arc<LyricsAuthManager>,
}

impl LyricsClient {
    pub fn new(client: Client, lyrics_url: String, auth: Arc<LyricsAuthManager>) -> Self {
        Self {
            client,
            lyrics_url,
            auth,
        }
    }

    /// Lyrics for `track_id`, or the empty document when there are none.
    ///
    /// Unlicensed tracks (404), an anonymous session or any other failure are
    /// logged and folded into [`LyricsDocument::empty`], so the caller always
    /// has something to render.
    pub async fn fetch_lyrics(&self, track_id: &str) -> LyricsDocument {
        match self.try_fetch(track_id).await {
            Ok(doc) => doc,
            Err(e) => {
                warning!("No lyrics for {}: {}", track_id, e);
                LyricsDocument::empty()
            }
        }
    }

    async fn try_fetch(&self, track_id: &str) -> Result<LyricsDocument, LyricsUnavailable> {
        if let Err(e) = self.auth.ensure_valid().await {
            // A stale token may still work; the request below decides.
            warning!("Lyrics token refresh failed: {}", e);
        }
        let token = self.auth.token().await?;

        let res = self
            .client
            .get(format!("{}/{}", self.lyrics_url, track_id))
            .query(&[("format", "json"), ("market", "from_token")])
            .header(USER_AGENT, common::WEB_PLAYER_USER_AGENT)
            .header("App-platform", common::WEB_PLAYER_PLATFORM)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?;

        let body = res.json::<LyricsResponse>().await?;
        Ok(body.lyrics.into())
    }
}
