/**
 * Authentication Extractors
 *
 * Resolve the bearer credential on a request to a user id through the
 * `TokenVerifier` in `AppState`.
 *
 * The credential is taken from the `token` query parameter first, since
 * browsers cannot set headers on a WebSocket upgrade, and otherwise from
 * `Authorization: Bearer <token>`.
 *
 * - **`AuthUser`** rejects with 401 when no valid credential is present. On
 *   WebSocket routes the rejection happens before the upgrade, so nothing
 *   touches the registry.
 * - **`MaybeAuthUser`** never rejects; an absent or invalid credential just
 *   means an anonymous caller.
 */

use axum::{
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::Deserialize;

use crate::backend::auth::AuthError;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Bearer credential carried by a request, if any
pub fn bearer_token(parts: &Parts) -> Option<String> {
    let from_query = Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(q)| q.token)
        .filter(|t| !t.is_empty());
    if from_query.is_some() {
        return from_query;
    }

    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Authenticated caller
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser(pub String);

impl AuthUser {
    pub fn user_id(&self) -> &str {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;
        let user_id = state.verifier.verify(&token)?;
        Ok(AuthUser(user_id))
    }
}

/// Caller that may or may not be authenticated
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaybeAuthUser(pub Option<String>);

impl MaybeAuthUser {
    pub fn user_id(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(MaybeAuthUser(None));
        };
        match state.verifier.verify(&token) {
            Ok(user_id) => Ok(MaybeAuthUser(Some(user_id))),
            Err(e) => {
                tracing::debug!("[Server] Ignoring invalid optional credential: {}", e);
                Ok(MaybeAuthUser(None))
            }
        }
    }
}
