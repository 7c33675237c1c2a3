use std::{fmt, str::FromStr};

use reqwest::Client;
use serde_json::Value;

use crate::{
    config::Settings,
    management::{CredentialManager, TokenError, TokenStore},
    spotify,
    types::CookieToken,
    utils, warning,
};

/// When the cookie-derived token gets re-fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LyricsRefreshPolicy {
    /// Only when the cached token is missing or expired.
    #[default]
    OnExpiry,
    /// Always once per use, and once more if the cached token had expired.
    Eager,
}

impl FromStr for LyricsRefreshPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on-expiry" | "on_expiry" | "lazy" => Ok(Self::OnExpiry),
            "eager" | "always" => Ok(Self::Eager),
            other => Err(format!("unknown policy '{other}', expected on-expiry or eager")),
        }
    }
}

impl fmt::Display for LyricsRefreshPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnExpiry => write!(f, "on-expiry"),
            Self::Eager => write!(f, "eager"),
        }
    }
}

/// Owns the web player token derived from the `sp_dc` cookie. The token only
/// lives in its cache file; every read goes to disk.
pub struct LyricsAuthManager {
    client: Client,
    token_url: String,
    sp_dc: String,
    store: TokenStore,
    policy: LyricsRefreshPolicy,
}

impl LyricsAuthManager {
    pub fn new(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            token_url: settings.endpoints.spotify_web_token_url.clone(),
            sp_dc: settings.sp_dc.clone(),
            store: TokenStore::new(settings.lyrics_token_path()),
            policy: settings.lyrics_policy,
        }
    }

    pub async fn ensure_valid(&self) -> Result<(), TokenError> {
        match self.policy {
            LyricsRefreshPolicy::OnExpiry => self.ensure_fresh().await,
            LyricsRefreshPolicy::Eager => match self.cached().await {
                None => self.refresh().await,
                Some(cached) => {
                    let first = self.refresh().await;
                    if cached.is_expired(utils::now_ms()) {
                        self.refresh().await
                    } else {
                        first
                    }
                }
            },
        }
    }

    /// The cached token, if it is present and not anonymous. Expiry is not
    /// checked here.
    pub async fn token(&self) -> Result<CookieToken, TokenError> {
        let value = self.store.load::<Value>().await?;
        let token = value
            .as_ref()
            .and_then(CookieToken::from_value)
            .ok_or(TokenError::AuthUnavailable)?;
        if token.is_anonymous {
            return Err(TokenError::AnonymousSession);
        }
        Ok(token)
    }

    async fn cached(&self) -> Option<CookieToken> {
        match self.store.load::<Value>().await {
            Ok(value) => value.as_ref().and_then(CookieToken::from_value),
            Err(e) => {
                warning!("Ignoring unreadable lyrics token cache: {}", e);
                None
            }
        }
    }
}

impl CredentialManager for LyricsAuthManager {
    fn name(&self) -> &'static str {
        "lyrics"
    }

    async fn is_valid(&self, now_ms: i64) -> bool {
        self.cached()
            .await
            .is_some_and(|token| !token.is_expired(now_ms))
    }

    async fn refresh(&self) -> Result<(), TokenError> {
        let value =
            match spotify::auth::fetch_web_player_token(&self.client, &self.token_url, &self.sp_dc)
                .await
            {
                Ok(value) => value,
                Err(e) => {
                    warning!("Failed to retrieve web player token: {}", e);
                    return Err(TokenError::from(e));
                }
            };

        let anonymous = value
            .get("isAnonymous")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !value.is_object() || anonymous {
            warning!("The SPOTIFY_SP_DC value seems to be invalid, please correct it!");
        }

        self.store.persist(&value).await?;
        Ok(())
    }
}
