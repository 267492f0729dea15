use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use oauth_callback::providers::HttpProvider;
use oauth_callback::store::{MySqlStore, TokenStore};
use oauth_callback::{api, AppState, Config, SharedState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oauth_callback=info,tower_http=info".into()),
        )
        .init();

    // Load config
    let config = Config::from_env()?;
    info!("oauth-callback v{}", env!("CARGO_PKG_VERSION"));

    if config.oauth.credentials().is_none() {
        warn!("REDIRECT_URI, CLIENT_ID or CLIENT_SECRET missing; /callback will return 500");
    }
    if config.debug {
        warn!("DEBUG=true: provider error payloads are included in responses");
    }

    // Initialize components
    let store = MySqlStore::initialize(config.database.as_ref()).await;
    if !store.is_enabled() {
        if config.file_fallback {
            info!(path = %config.fallback_path.display(), "Using file fallback for tokens");
        } else {
            warn!("No token storage available; set FILE_FALLBACK=true to write tokens to a file");
        }
    }

    let provider = HttpProvider::from_settings(&config.oauth);
    let addr = format!("{}:{}", config.host, config.port);

    // Build shared state
    let state: SharedState = Arc::new(AppState::new(config, Arc::new(store), Arc::new(provider)));

    // Build router
    let app = api::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
