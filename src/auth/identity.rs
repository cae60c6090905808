//! Identity resolution
//!
//! Turns an inbound bearer credential into a resolved user. Two entry
//! points share the decode step but differ in error semantics:
//!
//! - [`IdentityResolver::require_identity`]: absence, decode failure and
//!   unknown users are all errors.
//! - [`IdentityResolver::resolve_identity_if_present`]: absence yields no
//!   identity; decode failures propagate; a token for an unknown user also
//!   yields no identity rather than `UnknownUser`.
//!
//! The asymmetry is deliberate API surface; keep the two operations apart.

use axum::http::HeaderMap;

use super::token::TokenCodec;
use crate::data::{Database, User};
use crate::error::AppError;

/// Raw `Authorization` header value, if present.
///
/// The header carries the bare token; no scheme prefix is parsed.
/// A value that is not visible ASCII is kept as an empty credential
/// so that it fails decoding instead of reading as absent.
pub fn credential_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default().to_owned())
}

/// Resolves credentials against the token codec and user table
pub struct IdentityResolver<'a> {
    codec: &'a TokenCodec,
    db: &'a Database,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(codec: &'a TokenCodec, db: &'a Database) -> Self {
        Self { codec, db }
    }

    /// Resolve a mandatory identity
    ///
    /// # Errors
    /// - `MissingCredential` when no credential is supplied
    /// - `DecodeError` when the token does not verify
    /// - `UnknownUser` when no active user has the decoded id
    pub async fn require_identity(&self, credential: Option<&str>) -> Result<User, AppError> {
        let credential = credential.ok_or(AppError::MissingCredential)?;
        let user_id = self.codec.verify(credential)?;

        self.db
            .get_active_user(user_id)
            .await?
            .ok_or(AppError::UnknownUser)
    }

    /// Resolve an identity only when a credential is supplied
    ///
    /// # Errors
    /// `DecodeError` when a supplied token does not verify. Unknown users
    /// resolve to `None`.
    pub async fn resolve_identity_if_present(
        &self,
        credential: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        let Some(credential) = credential else {
            return Ok(None);
        };
        let user_id = self.codec.verify(credential)?;

        let user = self.db.get_active_user(user_id).await?;
        if user.is_none() {
            tracing::debug!(user_id, "Token decoded to unknown user; treating as anonymous");
        }

        Ok(user)
    }
}
