//! API layer
//!
//! HTTP handlers for:
//! - Postings feed, detail, creation and likes
//! - Comments
//! - Users (sign-in, signup, nickname check, account summary)
//! - Metrics (Prometheus)

mod comments;
mod dto;
pub mod metrics;
mod postings;
mod users;

pub use dto::*;

pub use comments::comments_router;
pub use metrics::{metrics_router, track_http_requests};
pub use postings::{MAX_IMAGE_UPLOAD_BYTES, postings_router};
pub use users::users_router;
