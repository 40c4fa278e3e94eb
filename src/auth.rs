use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum_extra::extract::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use serde::Deserialize;
use tracing::warn;

use crate::AppState;
use crate::error::ApiError;
use crate::gateway::Identity;
use crate::models::Actor;

#[derive(Debug, Default, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Picks the bearer credential from the `Authorization` header, falling back
/// to a `token` query parameter.
pub fn extract_token(
    auth: Option<Authorization<Bearer>>,
    query_token: Option<&str>,
) -> Result<String, ApiError> {
    auth.map(|a| a.token().to_string())
        .or_else(|| query_token.map(|s| s.to_string()))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing authentication token".into()))
}

pub fn actor_from_identity(identity: Identity, token: String) -> Result<Actor, ApiError> {
    if !identity.is_active {
        warn!(user_id = %identity.user_id, "inactive account rejected");
        return Err(ApiError::Unauthorized("Account is disabled".into()));
    }
    Ok(Actor {
        user_id: identity.user_id,
        role: identity.role,
        name: identity.name,
        email: identity.email,
        token,
    })
}

impl FromRequestParts<AppState> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|TypedHeader(auth)| auth);
        let query = Query::<TokenQuery>::from_request_parts(parts, state)
            .await
            .map(|Query(query)| query)
            .unwrap_or_default();
        let token = extract_token(header, query.token.as_deref())?;

        let identity = state.identity.verify(&token).await?;
        actor_from_identity(identity, token)
    }
}
