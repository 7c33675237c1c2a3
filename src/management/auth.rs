use std::sync::Arc;

use reqwest::Client;
use tokio::sync::RwLock;

use crate::{
    common,
    config::Settings,
    management::{CredentialManager, TokenError, TokenStore},
    spotify,
    types::{OAuthTokenPair, TokenResponse},
    utils, warning,
};

#[derive(Debug, Default)]
struct Session {
    pair: Option<OAuthTokenPair>,
    // None until a grant or a successful check tells us how long to trust it.
    expires_at_ms: Option<i64>,
}

/// Owns the OAuth pair of the playback API.
///
/// Constructed once at startup and shared behind an `Arc`. Requests call
/// [`ensure_valid`](Self::ensure_valid); the periodic driver calls
/// [`CredentialManager::refresh`]. Both may run at once and the last
/// completed grant wins.
pub struct PlaybackAuthManager {
    client: Client,
    settings: Arc<Settings>,
    store: TokenStore,
    session: RwLock<Session>,
}

impl PlaybackAuthManager {
    /// Loads the persisted pair, if any.
    pub async fn load(client: Client, settings: Arc<Settings>) -> Result<Self, TokenError> {
        let store = TokenStore::new(settings.oauth_token_path());
        let pair = store.load::<OAuthTokenPair>().await?;

        Ok(Self {
            client,
            settings,
            store,
            session: RwLock::new(Session {
                pair,
                expires_at_ms: None,
            }),
        })
    }

    pub fn authorize_url(&self, state: &str) -> Result<String, String> {
        spotify::auth::authorize_url(&self.settings, state)
    }

    /// Completes the consent flow and persists the initial pair.
    pub async fn exchange_code(&self, code: &str) -> Result<(), TokenError> {
        let res = spotify::auth::exchange_code(&self.client, &self.settings, code).await?;
        let Some(refresh_token) = res.refresh_token.clone().filter(|t| !t.is_empty()) else {
            return Err(TokenError::RefreshFailed(
                "authorization grant carried no refresh token".into(),
            ));
        };
        self.install(res, refresh_token).await
    }

    /// Returns an access token that authenticated recently, refreshing first
    /// when needed.
    pub async fn ensure_valid(&self) -> Result<String, TokenError> {
        self.ensure_fresh().await?;
        self.access_token().await.ok_or(TokenError::AuthUnavailable)
    }

    pub async fn access_token(&self) -> Option<String> {
        let session = self.session.read().await;
        session.pair.as_ref().map(|p| p.access_token.clone())
    }

    /// Whether a refresh token is on hand.
    pub async fn is_authorized(&self) -> bool {
        self.refresh_token().await.is_some()
    }

    async fn refresh_token(&self) -> Option<String> {
        let session = self.session.read().await;
        session
            .pair
            .as_ref()
            .map(|p| p.refresh_token.clone())
            .filter(|t| !t.is_empty())
    }

    async fn install(&self, res: TokenResponse, refresh_token: String) -> Result<(), TokenError> {
        let pair = OAuthTokenPair {
            access_token: res.access_token,
            refresh_token,
        };
        let expires_at_ms = res
            .expires_in
            .map(|secs| utils::now_ms() + secs * 1000 - common::OAUTH_EXPIRY_MARGIN_MS);

        {
            let mut session = self.session.write().await;
            session.pair = Some(pair.clone());
            session.expires_at_ms = expires_at_ms;
        }

        self.store.persist(&pair).await?;
        Ok(())
    }
}

impl CredentialManager for PlaybackAuthManager {
    fn name(&self) -> &'static str {
        "playback"
    }

    async fn is_valid(&self, now_ms: i64) -> bool {
        let (token, expires_at_ms) = {
            let session = self.session.read().await;
            (
                session.pair.as_ref().map(|p| p.access_token.clone()),
                session.expires_at_ms,
            )
        };

        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return false;
        };
        if let Some(expires_at_ms) = expires_at_ms {
            return expires_at_ms > now_ms;
        }

        // Expiry unknown, e.g. pair loaded from disk: ask the API.
        match spotify::auth::who_am_i(&self.client, &self.settings.endpoints.spotify_api_url, &token)
            .await
        {
            Ok(true) => {
                let mut session = self.session.write().await;
                if session.expires_at_ms.is_none() {
                    session.expires_at_ms = Some(now_ms + common::OAUTH_CHECK_TTL_MS);
                }
                true
            }
            Ok(false) => false,
            Err(e) => {
                warning!("Token check failed: {}", e);
                false
            }
        }
    }

    async fn refresh(&self) -> Result<(), TokenError> {
        let Some(refresh_token) = self.refresh_token().await else {
            return Err(TokenError::AuthUnavailable);
        };

        let res = spotify::auth::refresh_grant(&self.client, &self.settings, &refresh_token).await?;
        let refresh_token = res
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or(refresh_token);
        self.install(res, refresh_token).await
    }
}
