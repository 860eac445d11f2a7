use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::{cookie, jwt::JwtKeys};
use crate::error::ApiError;
use crate::users::repo_types::Role;

/// Authenticated caller identity as decoded from the session token.
/// The role reflects issuance time; role-gated routes re-check the
/// persisted record via the policy layer.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Extracts and verifies the session cookie. No database lookup happens
/// here; a missing cookie and a bad token fail identically.
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token =
            cookie::token_from_headers(&parts.headers).ok_or(ApiError::Unauthenticated)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(&token).map_err(|_| {
            warn!("invalid or expired session token");
            ApiError::Unauthenticated
        })?;

        Ok(AuthUser(Identity {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }))
    }
}
