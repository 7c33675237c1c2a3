use std::{fmt, future::Future, sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::{info, management::store::StoreError, utils, warning};

#[derive(Debug)]
pub enum TokenError {
    /// No credential to refresh from. Only an operator can fix this.
    AuthUnavailable,
    /// The session cookie produced an anonymous token.
    AnonymousSession,
    /// The grant or token request failed; a later attempt may succeed.
    RefreshFailed(String),
    Store(StoreError),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::AuthUnavailable => write!(f, "no credential available, authorization required"),
            TokenError::AnonymousSession => write!(f, "session cookie yields an anonymous token"),
            TokenError::RefreshFailed(reason) => write!(f, "token refresh failed: {reason}"),
            TokenError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<StoreError> for TokenError {
    fn from(err: StoreError) -> Self {
        TokenError::Store(err)
    }
}

impl From<reqwest::Error> for TokenError {
    fn from(err: reqwest::Error) -> Self {
        TokenError::RefreshFailed(err.to_string())
    }
}

/// A credential that expires and can renew itself.
///
/// Both the OAuth pair and the cookie-derived token implement this, so the
/// periodic driver and the "refresh if stale" check are written once.
pub trait CredentialManager: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the current credential can be used at `now_ms`.
    fn is_valid(&self, now_ms: i64) -> impl Future<Output = bool> + Send;

    /// Unconditionally obtains a new credential and persists it.
    fn refresh(&self) -> impl Future<Output = Result<(), TokenError>> + Send;

    /// Refreshes only when [`is_valid`](Self::is_valid) says so.
    fn ensure_fresh(&self) -> impl Future<Output = Result<(), TokenError>> + Send {
        async move {
            if self.is_valid(utils::now_ms()).await {
                return Ok(());
            }
            self.refresh().await
        }
    }
}

/// Runs `refresh` every `period`, starting immediately. Failures are logged
/// and the loop keeps going.
pub fn spawn_refresh_loop<M>(manager: Arc<M>, period: Duration) -> JoinHandle<()>
where
    M: CredentialManager + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match manager.refresh().await {
                Ok(()) => info!("Refreshed {} credential", manager.name()),
                Err(TokenError::AuthUnavailable) => {
                    warning!("Skipping {} refresh: not authorized yet", manager.name())
                }
                Err(e) => warning!("Periodic {} refresh failed: {}", manager.name(), e),
            }
        }
    })
}
