use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde_json::Value;

use super::traits::{OAuthProvider, Profile, TokenSet};
use crate::config::{ClientCredentials, OAuthSettings};
use crate::error::OAuthError;

const CLIENT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Generic OAuth 2.0 provider addressed by its token and profile URLs.
///
/// Quirks handled:
/// - Some providers report token errors with a 200 and an `error` field.
/// - User ids come back as strings or numbers; OIDC userinfo uses `sub`.
pub struct HttpProvider {
    token_url: String,
    profile_url: String,
    http: reqwest::Client,
}

impl HttpProvider {
    pub fn new(token_url: impl Into<String>, profile_url: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
            profile_url: profile_url.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn from_settings(settings: &OAuthSettings) -> Self {
        Self::new(&settings.token_url, &settings.profile_url)
    }
}

#[async_trait]
impl OAuthProvider for HttpProvider {
    async fn exchange_code(
        &self,
        code: &str,
        credentials: &ClientCredentials,
    ) -> Result<TokenSet, OAuthError> {
        let resp = self
            .http
            .post(&self.token_url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("redirect_uri", credentials.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::Exchange {
                status: None,
                body: format!("Token exchange request failed: {e}"),
            })?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(OAuthError::Exchange {
                status: Some(status),
                body,
            });
        }

        let value: Value = serde_json::from_str(&body).map_err(|_| OAuthError::Exchange {
            status: Some(status),
            body: body.clone(),
        })?;

        if value.get("error").is_some() {
            return Err(OAuthError::Exchange {
                status: Some(status),
                body,
            });
        }

        let tokens: TokenSet = serde_json::from_value(value).map_err(|e| OAuthError::Exchange {
            status: Some(status),
            body: format!("Failed to parse token response: {e}"),
        })?;

        if tokens.access_token.is_empty() {
            return Err(OAuthError::Exchange {
                status: Some(status),
                body: "Token response has an empty access_token".into(),
            });
        }

        Ok(tokens)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Profile, OAuthError> {
        let resp = self
            .http
            .get(&self.profile_url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await
            .map_err(|e| OAuthError::ProfileFetch {
                status: None,
                body: format!("Profile request failed: {e}"),
            })?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(OAuthError::ProfileFetch {
                status: Some(status),
                body,
            });
        }

        let value: Value =
            serde_json::from_str(&body).map_err(|_| OAuthError::MalformedProfile(body.clone()))?;

        let user_id = ["id", "sub"]
            .iter()
            .find_map(|key| match value.get(*key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .ok_or(OAuthError::MalformedProfile(body))?;

        Ok(Profile { user_id })
    }
}
