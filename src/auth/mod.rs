//! Authentication
//!
//! Handles:
//! - Self-issued token encode/verify
//! - Identity resolution (mandatory and optional)
//! - Request extractors for handlers
//! - OAuth provider profile lookup

mod identity;
mod middleware;
mod oauth;
mod token;

pub use identity::{IdentityResolver, credential_from_headers};
pub use middleware::{CurrentUser, MaybeUser};
pub use oauth::{KakaoClient, OAuthProvider};
#[cfg(test)]
pub use oauth::MockOAuthProvider;
pub use token::{TokenClaims, TokenCodec};
