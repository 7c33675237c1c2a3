use std::time::{Duration, Instant};

use crate::{cli::load_state, error, info, server, server::AppState, success, warning};

/// Runs the consent flow from the terminal.
///
/// Starts the API server, opens the authorize endpoint in the default browser
/// and waits for the callback to persist a new token pair.
///
/// # Flow
///
/// 1. **Server Start**: The regular API server is started so the redirect URI
///    configured in the Spotify dashboard can reach `/callback`
/// 2. **Browser Launch**: Opens the local authorize path, which redirects to
///    the consent screen
/// 3. **Token Exchange**: The callback handler exchanges the code and writes
///    the pair to the token cache
/// 4. **Shutdown**: The server is stopped once the new token is seen
///
/// # Error Handling
///
/// - Browser launch failures result in a warning with manual URL instructions
/// - Server startup failures and timeouts terminate with an error message
pub async fn auth() {
    let state = load_state().await;
    let before = state.playback_auth.access_token().await;

    let server_state = state.clone();
    let server = tokio::spawn(async move { server::start_api_server(server_state).await });

    let url = state.settings.local_url(&state.settings.authorize_path);
    info!("Waiting for authorization on {}", url);
    if webbrowser::open(&url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            url
        )
    }

    let authorized = wait_for_token(&state, before, &server).await;
    state.shutdown.cancel();

    match server.await {
        Ok(Err(e)) => error!("Server failed: {}", e),
        Err(e) => warning!("Server task ended abnormally: {}", e),
        Ok(Ok(())) => {}
    }

    if authorized {
        success!("Authentication successful!");
    } else {
        error!("Authentication failed or timed out.");
    }
}

/// Polls until the access token changes or 120 seconds pass.
async fn wait_for_token(
    state: &AppState,
    before: Option<String>,
    server: &tokio::task::JoinHandle<std::io::Result<()>>,
) -> bool {
    let max_wait = Duration::from_secs(120);
    let start = Instant::now();

    while start.elapsed() < max_wait {
        if server.is_finished() {
            return false;
        }
        if state.playback_auth.is_authorized().await
            && state.playback_auth.access_token().await != before
        {
            return true;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    false
}
