//! Error types for the chat gateway.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Identity provider errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Identity provider request failed: {0}")]
    Request(String),

    #[error("Identity provider rejected the request: {0}")]
    Rejected(String),

    #[error("Unexpected identity provider response: {0}")]
    InvalidResponse(String),
}

/// NLU relay errors.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The provider rejected the query input itself (its INVALID_ARGUMENT
    /// status). The only relay failure the HTTP surface distinguishes.
    #[error("Relay rejected the input as invalid")]
    InvalidArgument,

    #[error("Relay request failed: {0}")]
    Request(String),

    #[error("Unexpected relay response: {0}")]
    InvalidResponse(String),
}

/// Realtime database errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Request(String),

    #[error("Store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected store response: {0}")]
    InvalidResponse(String),
}

// ── HTTP surface ────────────────────────────────────────────────────────

/// Every failure a route can report, one variant per user-visible outcome.
///
/// Collaborator errors are collapsed into these categories at the handler
/// boundary; the underlying cause is logged, never surfaced to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("No token provided")]
    NoToken,

    #[error("Invalid token provided")]
    InvalidToken,

    #[error("Missing email or password")]
    MissingCredentials,

    #[error("User creation failed")]
    CreateUserFailed,

    #[error("Sign-in failed")]
    SignInFailed,

    #[error("Invalid argument")]
    InvalidArgument,

    #[error("Server error")]
    ServerError,
}

impl ApiError {
    /// HTTP status for this error.
    ///
    /// `MissingCredentials` returns 401 rather than 400 — kept for
    /// compatibility with the original backend's observed behavior.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoToken | ApiError::InvalidToken | ApiError::MissingCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::CreateUserFailed
            | ApiError::SignInFailed
            | ApiError::InvalidArgument
            | ApiError::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body for this error. Auth and account errors use a `message`
    /// key, relay/store errors an `error` key — clients depend on both
    /// shapes, so the asymmetry stays.
    pub fn body(&self) -> Value {
        match self {
            ApiError::NoToken => json!({"message": "No token provided"}),
            ApiError::InvalidToken => json!({"message": "Invalid token provided."}),
            ApiError::MissingCredentials => {
                json!({"message": "Error missing email or password"})
            }
            ApiError::CreateUserFailed => json!({"message": "Error creating user"}),
            ApiError::SignInFailed => {
                json!({"message": "There was an error logging in"})
            }
            ApiError::InvalidArgument => json!({"error": "Invalid Argument"}),
            ApiError::ServerError => json!({"error": "server error"}),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        tracing::warn!(error = %e, "Store call failed");
        ApiError::ServerError
    }
}

impl From<RelayError> for ApiError {
    fn from(e: RelayError) -> Self {
        match e {
            RelayError::InvalidArgument => ApiError::InvalidArgument,
            other => {
                tracing::warn!(error = %other, "Relay call failed");
                ApiError::ServerError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_401() {
        assert_eq!(ApiError::NoToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        // 401 (not 400) for missing signup fields is intentional.
        assert_eq!(
            ApiError::MissingCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn upstream_errors_map_to_500() {
        for e in [
            ApiError::CreateUserFailed,
            ApiError::SignInFailed,
            ApiError::InvalidArgument,
            ApiError::ServerError,
        ] {
            assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn body_key_asymmetry_is_preserved() {
        assert!(ApiError::NoToken.body().get("message").is_some());
        assert!(ApiError::CreateUserFailed.body().get("message").is_some());
        assert_eq!(ApiError::InvalidArgument.body()["error"], "Invalid Argument");
        assert_eq!(ApiError::ServerError.body()["error"], "server error");
    }

    #[test]
    fn relay_invalid_argument_keeps_its_identity() {
        assert_eq!(
            ApiError::from(RelayError::InvalidArgument),
            ApiError::InvalidArgument
        );
        assert_eq!(
            ApiError::from(RelayError::Request("boom".into())),
            ApiError::ServerError
        );
    }

    #[test]
    fn store_errors_collapse_to_server_error() {
        let e = StoreError::Status {
            status: 503,
            body: "unavailable".into(),
        };
        assert_eq!(ApiError::from(e), ApiError::ServerError);
    }
}
