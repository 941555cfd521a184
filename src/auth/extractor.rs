//! Axum extractor guarding the write endpoints.
//!
//! ```rust,ignore
//! async fn create(Auth(claims): Auth, State(state): State<Arc<AppState>>) -> ... {
//!     // claims.username is the signed-in editor
//! }
//! ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use super::{AuthError, Claims};
use crate::state::AppState;

/// Claims of a request carrying a valid `Authorization: Bearer <token>`.
pub struct Auth(pub Claims);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::TokenMissing)?
            .to_str()
            .map_err(|_| AuthError::TokenInvalid)?;

        let token = match header.trim().strip_prefix("Bearer") {
            Some(rest) if rest.trim().is_empty() => return Err(AuthError::TokenMissing),
            Some(rest) if rest.starts_with(' ') => rest.trim(),
            _ => return Err(AuthError::TokenInvalid),
        };

        let claims = state.credentials.verify_token(token)?;
        Ok(Auth(claims))
    }
}
