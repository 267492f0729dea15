use std::path::PathBuf;

use anyhow::{Context, Result};
use sqlx::mysql::MySqlConnectOptions;

const DEFAULT_TOKEN_URL: &str = "https://discord.com/api/oauth2/token";
const DEFAULT_PROFILE_URL: &str = "https://discord.com/api/users/@me";

/// Application configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // ── Server ──────────────────────────────────────────────────────────
    pub host: String,
    pub port: u16,

    // ── OAuth client ────────────────────────────────────────────────────
    pub oauth: OAuthSettings,

    // ── Persistence ─────────────────────────────────────────────────────
    /// `None` unless every MYSQL* connection variable is set.
    pub database: Option<DatabaseConfig>,
    /// Append tokens to a local file when the database is unavailable.
    pub file_fallback: bool,
    pub fallback_path: PathBuf,

    // ── Diagnostics ─────────────────────────────────────────────────────
    /// Include provider error payloads in 500 responses. Never enable on a
    /// publicly reachable deployment.
    pub debug: bool,
}

#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_url: String,
    pub profile_url: String,
}

/// The complete credential triple needed for a code exchange.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values are treated the same as unset ones.
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let flag = |key: &str| lookup(key).as_deref() == Some("true");

        let database = match (
            var("MYSQLHOST"),
            var("MYSQLUSER"),
            var("MYSQLPASSWORD"),
            var("MYSQLDATABASE"),
        ) {
            (Some(host), Some(user), Some(password), Some(database)) => Some(DatabaseConfig {
                host,
                port: var("MYSQLPORT")
                    .unwrap_or_else(|| "3306".into())
                    .parse()
                    .context("Invalid MYSQLPORT")?,
                user,
                password,
                database,
            }),
            _ => None,
        };

        Ok(Config {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: var("PORT")
                .unwrap_or_else(|| "3000".into())
                .parse()
                .context("Invalid PORT")?,

            oauth: OAuthSettings {
                redirect_uri: var("REDIRECT_URI"),
                client_id: var("CLIENT_ID"),
                client_secret: var("CLIENT_SECRET"),
                token_url: var("TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.into()),
                profile_url: var("PROFILE_URL").unwrap_or_else(|| DEFAULT_PROFILE_URL.into()),
            },

            database,
            file_fallback: flag("FILE_FALLBACK"),
            fallback_path: var("FALLBACK_PATH")
                .unwrap_or_else(|| "tokens.jsonl".into())
                .into(),

            debug: flag("DEBUG"),
        })
    }
}

impl OAuthSettings {
    /// Returns `None` if any of the redirect URI, client id or secret is missing.
    pub fn credentials(&self) -> Option<ClientCredentials> {
        Some(ClientCredentials {
            client_id: self.client_id.clone()?,
            client_secret: self.client_secret.clone()?,
            redirect_uri: self.redirect_uri.clone()?,
        })
    }
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "0.0.0.0");
        assert!(config.database.is_none());
        assert!(config.oauth.credentials().is_none());
        assert!(!config.file_fallback);
        assert!(!config.debug);
        assert_eq!(config.oauth.token_url, DEFAULT_TOKEN_URL);
    }

    #[test]
    fn test_credentials_require_all_three() {
        let config = config_from(&[("CLIENT_ID", "id"), ("CLIENT_SECRET", "secret")]).unwrap();
        assert!(config.oauth.credentials().is_none());

        let config = config_from(&[
            ("CLIENT_ID", "id"),
            ("CLIENT_SECRET", "secret"),
            ("REDIRECT_URI", ""),
        ])
        .unwrap();
        assert!(config.oauth.credentials().is_none());

        let config = config_from(&[
            ("CLIENT_ID", "id"),
            ("CLIENT_SECRET", "secret"),
            ("REDIRECT_URI", "https://example.com/callback"),
        ])
        .unwrap();
        let creds = config.oauth.credentials().unwrap();
        assert_eq!(creds.client_id, "id");
        assert_eq!(creds.redirect_uri, "https://example.com/callback");
    }

    #[test]
    fn test_database_requires_all_fields() {
        let partial = config_from(&[
            ("MYSQLHOST", "db"),
            ("MYSQLUSER", "root"),
            ("MYSQLDATABASE", "app"),
        ])
        .unwrap();
        assert!(partial.database.is_none());

        let full = config_from(&[
            ("MYSQLHOST", "db"),
            ("MYSQLUSER", "root"),
            ("MYSQLPASSWORD", "pw"),
            ("MYSQLDATABASE", "app"),
        ])
        .unwrap();
        let db = full.database.unwrap();
        assert_eq!(db.port, 3306);
        assert_eq!(db.host, "db");
    }

    #[test]
    fn test_flags_need_exact_true() {
        let config = config_from(&[("FILE_FALLBACK", "TRUE"), ("DEBUG", "1")]).unwrap();
        assert!(!config.file_fallback);
        assert!(!config.debug);

        let config = config_from(&[("FILE_FALLBACK", "true"), ("DEBUG", "true")]).unwrap();
        assert!(config.file_fallback);
        assert!(config.debug);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(config_from(&[("PORT", "http")]).is_err());
        assert!(config_from(&[
            ("MYSQLHOST", "db"),
            ("MYSQLUSER", "root"),
            ("MYSQLPASSWORD", "pw"),
            ("MYSQLDATABASE", "app"),
            ("MYSQLPORT", "-1"),
        ])
        .is_err());
    }
}
