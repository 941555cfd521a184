//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization` header on a protected route.
    #[error("Token not provided")]
    TokenMissing,
    /// Wrong scheme, bad signature, malformed or expired token.
    #[error("Invalid token")]
    TokenInvalid,
    /// Login failed. Deliberately the same for unknown users and wrong passwords.
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Authentication failure: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::TokenMissing | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::TokenInvalid => StatusCode::FORBIDDEN,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(ref cause) = self {
            tracing::error!("Authentication failure: {}", cause);
            return (
                self.status_code(),
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response();
        }

        (self.status_code(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_token_returns_401() {
        let response = AuthError::TokenMissing.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error"], "Token not provided");
    }

    #[test]
    fn invalid_token_is_forbidden() {
        assert_eq!(AuthError::TokenInvalid.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn internal_errors_hide_their_cause() {
        let response = AuthError::Internal("bcrypt exploded".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert!(!body.contains("bcrypt"));
    }
}
