use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde_json::{json, Value};

const INVALID_GRANT_MESSAGE: &str = "This authorization code is invalid or has expired. \
     Please restart the authorization flow and try again.";

/// Errors from the identity provider's token and profile endpoints.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// `status` is `None` when the request never got a response.
    #[error("Token exchange failed: {body}")]
    Exchange {
        status: Option<StatusCode>,
        body: String,
    },

    #[error("Profile fetch failed: {body}")]
    ProfileFetch {
        status: Option<StatusCode>,
        body: String,
    },

    #[error("Profile response has no user id: {0}")]
    MalformedProfile(String),
}

impl OAuthError {
    /// Whether the provider rejected the code itself (used, expired or revoked).
    pub fn is_invalid_grant(&self) -> bool {
        let OAuthError::Exchange { body, .. } = self else {
            return false;
        };

        let code = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_owned));

        match code {
            Some(code) => code == "invalid_grant",
            None => body.contains("invalid_grant"),
        }
    }

    /// Diagnostic payload for debug responses.
    pub fn details(&self) -> Value {
        let (stage, status, body) = match self {
            OAuthError::Exchange { status, body } => ("exchange", *status, body.as_str()),
            OAuthError::ProfileFetch { status, body } => ("profile", *status, body.as_str()),
            OAuthError::MalformedProfile(body) => ("profile", None, body.as_str()),
        };

        let body = serde_json::from_str::<Value>(body).unwrap_or_else(|_| json!(body));

        json!({
            "stage": stage,
            "status": status.map(|s| s.as_u16()),
            "body": body,
        })
    }
}

/// Storage failures. Always recovered by the caller; see [`crate::store::WriteOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid token record: {0}")]
    InvalidRecord(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum FallbackError {
    #[error("Fallback file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fallback record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors that end a `/callback` request.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("Missing authorization code")]
    MissingCode,

    #[error("OAuth client is not configured")]
    NotConfigured,

    #[error("Authorization grant is invalid or expired")]
    InvalidGrant,

    /// `details` is only populated in debug mode.
    #[error("Authorization failed")]
    Provider { details: Option<Value> },
}

impl CallbackError {
    pub fn from_provider(err: OAuthError, debug: bool) -> Self {
        if err.is_invalid_grant() {
            tracing::warn!("Authorization code rejected by provider: {err}");
            return CallbackError::InvalidGrant;
        }

        tracing::error!("OAuth flow failed: {err}");
        CallbackError::Provider {
            details: debug.then(|| err.details()),
        }
    }
}

impl IntoResponse for CallbackError {
    fn into_response(self) -> Response {
        match self {
            CallbackError::MissingCode => {
                (StatusCode::BAD_REQUEST, "Missing authorization code.").into_response()
            }
            CallbackError::NotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server OAuth configuration is incomplete.",
            )
                .into_response(),
            CallbackError::InvalidGrant => {
                (StatusCode::BAD_REQUEST, Html(INVALID_GRANT_MESSAGE)).into_response()
            }
            CallbackError::Provider { details: None } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authorization failed. Please try again later.",
            )
                .into_response(),
            CallbackError::Provider {
                details: Some(details),
            } => {
                let body = json!({
                    "error": "Authorization failed",
                    "details": details,
                });
                (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(body: &str) -> OAuthError {
        OAuthError::Exchange {
            status: Some(StatusCode::BAD_REQUEST),
            body: body.into(),
        }
    }

    #[test]
    fn test_invalid_grant_from_json_error_field() {
        let err = exchange(r#"{"error":"invalid_grant","error_description":"Invalid \"code\""}"#);
        assert!(err.is_invalid_grant());
    }

    #[test]
    fn test_other_json_errors_are_not_invalid_grant() {
        let err = exchange(
            r#"{"error":"invalid_client","error_description":"mentions invalid_grant"}"#,
        );
        assert!(!err.is_invalid_grant());
    }

    #[test]
    fn test_invalid_grant_from_plain_body() {
        assert!(exchange("error=invalid_grant").is_invalid_grant());
        assert!(!exchange("Bad Gateway").is_invalid_grant());
    }

    #[test]
    fn test_profile_errors_never_invalid_grant() {
        let err = OAuthError::ProfileFetch {
            status: Some(StatusCode::UNAUTHORIZED),
            body: r#"{"error":"invalid_grant"}"#.into(),
        };
        assert!(!err.is_invalid_grant());
    }

    #[test]
    fn test_details_parse_json_body() {
        let details = exchange(r#"{"error":"invalid_client"}"#).details();
        assert_eq!(details["stage"], "exchange");
        assert_eq!(details["status"], 400);
        assert_eq!(details["body"]["error"], "invalid_client");

        let details = OAuthError::ProfileFetch {
            status: None,
            body: "connection refused".into(),
        }
        .details();
        assert_eq!(details["stage"], "profile");
        assert!(details["status"].is_null());
        assert_eq!(details["body"], "connection refused");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CallbackError::MissingCode.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CallbackError::NotConfigured.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            CallbackError::InvalidGrant.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CallbackError::Provider { details: None }
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_provider_hides_details_outside_debug() {
        let err = CallbackError::from_provider(exchange("upstream down"), false);
        assert!(matches!(err, CallbackError::Provider { details: None }));

        let err = CallbackError::from_provider(exchange("upstream down"), true);
        assert!(matches!(err, CallbackError::Provider { details: Some(_) }));
    }
}
