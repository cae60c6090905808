//! Request/response DTOs and extractors
//!
//! The `Api*` extractors wrap axum's own and turn their rejections into
//! `AppError`, so malformed input answers with the usual JSON error body.

use axum::extract::{FromRequest, FromRequestParts};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::service::{CommentView, FeedItem, PostingDetail};

/// JSON body extractor
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path parameter extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// `{"message": ...}` acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

// =============================================================================
// Postings
// =============================================================================

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub result: Vec<FeedItem>,
}

#[derive(Debug, Serialize)]
pub struct PostingDetailResponse {
    pub posting: PostingDetail,
}

// =============================================================================
// Comments
// =============================================================================

/// Query of `GET /comments`
#[derive(Debug, Default, Deserialize)]
pub struct CommentListQuery {
    pub posting_id: Option<i64>,
    pub limit: Option<i64>,
    /// 1-indexed page number
    pub offset: Option<i64>,
}

/// Query of `POST /comments`; parsed by hand so a bad id maps to
/// `INVALID_POSTING_ID` rather than a generic validation error
#[derive(Debug, Default, Deserialize)]
pub struct CommentTargetQuery {
    pub posting_id: Option<String>,
}

impl CommentTargetQuery {
    pub fn posting_id(&self) -> Result<i64, AppError> {
        self.posting_id
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .ok_or(AppError::InvalidPostingId)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub comment: Vec<CommentView>,
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct NicknameCheckRequest {
    pub nickname: String,
}

#[derive(Debug, Serialize)]
pub struct NicknameTakenResponse {
    pub message: &'static str,
    #[serde(rename = "recommendNickname")]
    pub recommend_nickname: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_target_requires_numeric_id() {
        let parse = |raw: Option<&str>| {
            CommentTargetQuery {
                posting_id: raw.map(str::to_string),
            }
            .posting_id()
        };

        assert_eq!(parse(Some("12")).unwrap(), 12);
        assert!(matches!(parse(None), Err(AppError::InvalidPostingId)));
        assert!(matches!(parse(Some("abc")), Err(AppError::InvalidPostingId)));
        assert!(matches!(parse(Some("")), Err(AppError::InvalidPostingId)));
    }

    #[test]
    fn nickname_taken_uses_camel_case_key() {
        let body = serde_json::to_value(NicknameTakenResponse {
            message: "NICKNAME_ALREADY_EXISTS",
            recommend_nickname: "jy21".to_string(),
        })
        .unwrap();

        assert_eq!(body["recommendNickname"], "jy21");
    }
}
