use std::sync::Arc;

use crate::{
    cli::load_state, common, error, info, management::spawn_refresh_loop, server, warning,
};

pub async fn serve() {
    let state = load_state().await;

    if !state.playback_auth.is_authorized().await {
        warning!(
            "No Spotify authorization yet. Open {} to connect an account.",
            state.settings.local_url(&state.settings.authorize_path)
        );
    }

    let refresher = spawn_refresh_loop(
        Arc::clone(&state.playback_auth),
        common::OAUTH_REFRESH_PERIOD,
    );

    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down...");
            shutdown.cancel();
        }
    });

    info!("Server running on http://{}", state.settings.server_address);
    let result = server::start_api_server(state).await;
    refresher.abort();

    if let Err(e) = result {
        error!("Server failed: {}", e);
    }
}
