//! Authentication extractors
//!
//! Handlers opt into identity resolution by taking one of these as an
//! argument; the extractor runs before the handler body, so a failed
//! resolution aborts the request before any domain logic.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use super::identity::{IdentityResolver, credential_from_headers};
use crate::AppState;
use crate::data::User;
use crate::error::AppError;

/// Extractor for a mandatory identity
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", user.nickname)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let credential = credential_from_headers(&parts.headers);

        let user = IdentityResolver::new(&state.token_codec, &state.db)
            .require_identity(credential.as_deref())
            .await?;

        Ok(CurrentUser(user))
    }
}

/// Optional identity extractor
///
/// Returns None when no credential is sent. A credential that fails to
/// decode still rejects the request.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let credential = credential_from_headers(&parts.headers);

        let user = IdentityResolver::new(&state.token_codec, &state.db)
            .resolve_identity_if_present(credential.as_deref())
            .await?;

        Ok(MaybeUser(user))
    }
}
