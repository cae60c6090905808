//! Data models
//!
//! Rust structs representing database rows.
//! Integer row IDs are assigned by SQLite; timestamps use chrono.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// User
// =============================================================================

/// A member signed in through the OAuth provider
///
/// `id` is immutable once assigned. Nicknames are not unique.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    /// Account id at the OAuth provider
    pub kakao_id: String,
    pub email: String,
    pub nickname: String,
    pub introduction: Option<String>,
    pub profile_image: Option<String>,
    /// Soft-delete flag; deleted users never resolve as an identity
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied at signup
#[derive(Debug, Clone)]
pub struct NewUser {
    pub kakao_id: String,
    pub email: String,
    pub nickname: String,
    pub profile_image: Option<String>,
}

// =============================================================================
// Facets
// =============================================================================

/// Lookup dimension used to tag and filter postings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetKind {
    HousingType,
    Size,
    Style,
    Color,
}

impl FacetKind {
    /// Backing lookup table
    pub fn table(&self) -> &'static str {
        match self {
            Self::HousingType => "housing_types",
            Self::Size => "sizes",
            Self::Style => "styles",
            Self::Color => "colors",
        }
    }
}

/// One `{id, label}` row of a facet table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Facet {
    pub id: i64,
    pub label: String,
}

// =============================================================================
// Posting
// =============================================================================

/// An image post tagged with facets
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Posting {
    pub id: i64,
    /// Author
    pub user_id: i64,
    pub housing_type_id: i64,
    /// Coarse size bucket
    pub size_id: i64,
    pub style_id: i64,
    pub item_color_id: i64,
    pub back_color_id: i64,
    /// Public image URL
    pub image: String,
    pub text: String,
    /// Incremented on every detail fetch
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when writing a posting
#[derive(Debug, Clone)]
pub struct NewPosting {
    pub user_id: i64,
    pub housing_type_id: i64,
    pub size_id: i64,
    pub style_id: i64,
    pub item_color_id: i64,
    pub back_color_id: i64,
    pub image: String,
    pub text: String,
}

/// Posting joined with its facet labels, author, and like count
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostingDetailRow {
    pub id: i64,
    pub image: String,
    pub text: String,
    pub view_count: i64,
    pub size_label: String,
    pub style_label: String,
    pub housing_type_label: String,
    pub like_count: i64,
    pub author_id: i64,
    pub author_nickname: String,
    pub author_profile_image: Option<String>,
    pub author_introduction: Option<String>,
}

// =============================================================================
// Comment
// =============================================================================

/// Comment on a posting
///
/// `parent_id` points at another comment in the same table. Only
/// stored and filtered; replies are never rendered nested.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub posting_id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when writing a comment
#[derive(Debug, Clone)]
pub struct NewComment {
    pub posting_id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Comment joined with its author for list display
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
    pub user_nickname: String,
    pub user_profile: Option<String>,
}

/// First comment of a posting (by creation time) and its author
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CommentPreview {
    pub posting_id: i64,
    pub author_image: Option<String>,
    pub author_nickname: String,
    pub text: String,
}

// =============================================================================
// Feed query
// =============================================================================

/// Exact-match facet filters; `None` drops the predicate entirely
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetFilter {
    pub housing_type_id: Option<i64>,
    pub back_color_id: Option<i64>,
    pub item_color_id: Option<i64>,
    pub style_id: Option<i64>,
}

/// Caller-supplied sort field, passed through unvalidated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    /// Parse `field` or `-field`
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('-') {
            Some(field) => Self {
                field: field.to_string(),
                descending: true,
            },
            None => Self {
                field: raw.to_string(),
                descending: false,
            },
        }
    }
}

/// Normalized feed query consumed by the database layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub facets: FacetFilter,
    /// Inclusive size bucket range
    pub min_bucket: i64,
    pub max_bucket: i64,
    pub sort: SortKey,
    pub skip: i64,
    pub limit: i64,
}
