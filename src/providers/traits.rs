use async_trait::async_trait;
use serde::Deserialize;

use crate::config::ClientCredentials;
use crate::error::OAuthError;

/// Tokens returned from the provider's token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
    pub scope: Option<String>,
}

/// The part of the provider's user profile we keep.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user_id: String,
}

/// An identity provider that speaks the authorization-code grant.
///
/// Authorization codes are single-use, so neither call is retried: a second
/// `exchange_code` with the same code is rejected with `invalid_grant`.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Exchange an authorization code for an access token (and optionally refresh token).
    async fn exchange_code(
        &self,
        code: &str,
        credentials: &ClientCredentials,
    ) -> Result<TokenSet, OAuthError>;

    /// Resolve the user behind an access token.
    async fn fetch_profile(&self, access_token: &str) -> Result<Profile, OAuthError>;
}
