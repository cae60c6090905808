//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services are built per request from the shared `Arc` handles in
//! `AppState`.

mod account;
mod comment;
pub mod feed;
mod nickname;
mod posting;

pub use account::{
    AccountService, AccountSummary, ExternalId, SigninResult, SignupRequest, SignupResult,
};
pub use comment::{CommentService, CommentView, DEFAULT_COMMENT_LIMIT};
pub use feed::{FeedItem, FeedParams, FeedService};
pub use nickname::{Availability, NicknameResolver, suggest_nickname};
pub use posting::{AuthorSummary, ImageUpload, PostingDetail, PostingInfo, PostingService};
