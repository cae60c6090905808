//! OAuth provider client
//!
//! Sign-in hands us a provider access token; we exchange it for the
//! provider's user profile. The profile is returned as raw JSON and parsed
//! by the account service so the HTTP contract stays opaque here.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::KakaoOAuthConfig;
use crate::error::AppError;

/// Source of user profiles for a provider access token
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Fetch the profile behind `access_token`
    ///
    /// # Errors
    /// - `UpstreamRejected` when the provider refuses the token
    /// - `Upstream` on transport failure or an undecodable body
    async fn fetch_profile(&self, access_token: &str) -> Result<serde_json::Value, AppError>;
}

/// Kakao user-info client
pub struct KakaoClient {
    http_client: reqwest::Client,
    user_info_url: String,
}

impl KakaoClient {
    pub fn new(config: &KakaoOAuthConfig) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("homefeed/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(Self {
            http_client,
            user_info_url: config.user_info_url.clone(),
        })
    }
}

#[async_trait]
impl OAuthProvider for KakaoClient {
    async fn fetch_profile(&self, access_token: &str) -> Result<serde_json::Value, AppError> {
        let response = self
            .http_client
            .get(&self.user_info_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Kakao user-info request failed");
                AppError::Upstream(format!("provider request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::info!(%status, "Kakao rejected access token");
            return Err(AppError::UpstreamRejected);
        }

        response.json::<serde_json::Value>().await.map_err(|e| {
            tracing::warn!(error = %e, "Kakao user-info body is not JSON");
            AppError::Upstream(format!("provider response unreadable: {e}"))
        })
    }
}
