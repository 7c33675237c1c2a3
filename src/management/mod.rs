mod auth;
mod credential;
mod lyrics;
mod store;

pub use auth::PlaybackAuthManager;
pub use credential::CredentialManager;
pub use credential::TokenError;
pub use credential::spawn_refresh_loop;
pub use lyrics::LyricsAuthManager;
pub use lyrics::LyricsRefreshPolicy;
pub use store::StoreError;
pub use store::TokenStore;
