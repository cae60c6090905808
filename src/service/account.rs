//! Account service
//!
//! Sign-in through the OAuth provider, signup and the account summary.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{OAuthProvider, TokenCodec};
use crate::data::{Database, NewUser, User};
use crate::error::AppError;
use crate::mail::{MailMessage, Mailer, send_best_effort};
use crate::metrics::SIGNUPS_TOTAL;

/// Provider account id; the provider sends a number, clients may echo it
/// back as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// Provider profile as presented to the client after sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SigninResult {
    pub id: ExternalId,
    pub email: String,
    pub nickname: String,
    /// `None` when the provider reports its default image
    pub profile_image: Option<String>,
    /// Present only for already registered users
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub nickname: String,
    #[serde(default)]
    pub profile_image: Option<String>,
    pub id: ExternalId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupResult {
    pub profile_image: Option<String>,
    pub self_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    /// Image URLs of the user's postings, oldest first
    pub postings: Vec<String>,
    /// Likes the user has given
    pub likes: i64,
}

#[derive(Deserialize)]
struct KakaoUser {
    id: ExternalId,
    kakao_account: KakaoAccount,
}

#[derive(Deserialize)]
struct KakaoAccount {
    email: String,
    profile: KakaoProfile,
}

#[derive(Deserialize)]
struct KakaoProfile {
    nickname: String,
    #[serde(default)]
    profile_image_url: Option<String>,
    is_default_image: bool,
}

fn parse_provider_profile(
    raw: serde_json::Value,
) -> Result<(ExternalId, String, String, Option<String>), AppError> {
    let user: KakaoUser = serde_json::from_value(raw)
        .map_err(|e| AppError::Validation(format!("provider profile: {e}")))?;
    let profile = user.kakao_account.profile;

    let profile_image = if profile.is_default_image {
        None
    } else {
        Some(profile.profile_image_url.ok_or_else(|| {
            AppError::Validation("provider profile: missing field `profile_image_url`".to_string())
        })?)
    };

    Ok((user.id, user.kakao_account.email, profile.nickname, profile_image))
}

pub struct AccountService {
    db: Arc<Database>,
    tokens: Arc<TokenCodec>,
    oauth: Arc<dyn OAuthProvider>,
    mailer: Arc<dyn Mailer>,
}

impl AccountService {
    pub fn new(
        db: Arc<Database>,
        tokens: Arc<TokenCodec>,
        oauth: Arc<dyn OAuthProvider>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            db,
            tokens,
            oauth,
            mailer,
        }
    }

    /// Exchange a provider access token for the provider profile
    ///
    /// # Errors
    /// - `UpstreamRejected` / `Upstream` from the provider call
    /// - `Validation` when the profile lacks a required key
    pub async fn signin(&self, access_token: &str) -> Result<SigninResult, AppError> {
        let raw = self.oauth.fetch_profile(access_token).await?;
        let (id, email, nickname, profile_image) = parse_provider_profile(raw)?;

        let self_token = match self.db.get_user_by_kakao_id(&id.to_string()).await? {
            Some(user) => Some(self.tokens.issue(user.id)?),
            None => None,
        };
        tracing::info!(
            external_id = %id,
            registered = self_token.is_some(),
            "Provider sign-in"
        );

        Ok(SigninResult {
            id,
            email,
            nickname,
            profile_image,
            self_token,
        })
    }

    /// Register a user and issue their first token
    ///
    /// Does not re-check nickname availability.
    pub async fn signup(&self, request: SignupRequest) -> Result<SignupResult, AppError> {
        let user = self
            .db
            .insert_user(&NewUser {
                kakao_id: request.id.to_string(),
                email: request.email,
                nickname: request.nickname,
                profile_image: request.profile_image,
            })
            .await?;
        let self_token = self.tokens.issue(user.id)?;

        SIGNUPS_TOTAL.inc();
        tracing::info!(user_id = user.id, "User signed up");

        send_best_effort(
            self.mailer.clone(),
            MailMessage::welcome(&user.email, &user.nickname),
        );

        Ok(SignupResult {
            profile_image: user.profile_image,
            self_token,
        })
    }

    pub async fn summary(&self, user: &User) -> Result<AccountSummary, AppError> {
        let (postings, likes) = tokio::try_join!(
            self.db.get_posting_images_by_user(user.id),
            self.db.count_likes_by_user(user.id),
        )?;

        Ok(AccountSummary { postings, likes })
    }
}
