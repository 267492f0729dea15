pub mod api;
pub mod config;
pub mod error;
pub mod fallback;
pub mod providers;
pub mod store;

pub use config::Config;
pub use error::CallbackError;

use std::sync::Arc;

use fallback::FallbackWriter;
use providers::OAuthProvider;
use store::TokenStore;

/// Shared application state passed to all API handlers.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn TokenStore>,
    pub provider: Arc<dyn OAuthProvider>,
    /// Present only when `FILE_FALLBACK=true`.
    pub fallback: Option<FallbackWriter>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn TokenStore>,
        provider: Arc<dyn OAuthProvider>,
    ) -> Self {
        let fallback = config
            .file_fallback
            .then(|| FallbackWriter::new(config.fallback_path.clone()));

        Self {
            config,
            store,
            provider,
            fallback,
        }
    }
}
