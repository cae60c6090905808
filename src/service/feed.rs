//! Feed service
//!
//! A feed request goes through two pure steps around one storage round:
//!
//! 1. [`plan`] normalizes the raw query parameters into a [`FeedQuery`]
//!    (size range to bucket range, page number to skip count).
//! 2. Storage returns the page of postings plus batch-loaded authors,
//!    counts and comment previews.
//! 3. [`aggregate`] joins those into [`FeedItem`] view models.

use serde::{Deserialize, Deserializer, Serialize, de};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::data::{
    CommentPreview, Database, FacetFilter, FeedQuery, Posting, SortKey, User,
};
use crate::error::AppError;

pub const DEFAULT_MIN_SIZE: i64 = 1;
pub const DEFAULT_MAX_SIZE: i64 = 71;
pub const DEFAULT_LIMIT: i64 = 8;
pub const DEFAULT_SORT: &str = "create_at";

/// Raw feed query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedParams {
    #[serde(rename = "housing-type", default, deserialize_with = "blank_as_none")]
    pub housing_type: Option<i64>,
    #[serde(rename = "back-color", default, deserialize_with = "blank_as_none")]
    pub back_color: Option<i64>,
    #[serde(rename = "item-color", default, deserialize_with = "blank_as_none")]
    pub item_color: Option<i64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub style: Option<i64>,
    #[serde(rename = "min-size")]
    pub min_size: Option<i64>,
    #[serde(rename = "max-size")]
    pub max_size: Option<i64>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
    /// 1-indexed page number
    pub offset: Option<i64>,
}

/// A facet sent with no value (`?style=`) filters nothing.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

/// `ceil(value / 10)`
pub fn size_to_bucket(value: i64) -> i64 {
    let quotient = value.div_euclid(10);
    if value.rem_euclid(10) > 0 {
        quotient + 1
    } else {
        quotient
    }
}

/// Normalize feed parameters. Performs no I/O.
///
/// The sort field is passed through as given; storage decides whether it
/// names a sortable column.
///
/// # Errors
/// `Validation` for a negative limit, a page number below 1, or a page
/// too large to address.
pub fn plan(params: &FeedParams) -> Result<FeedQuery, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if limit < 0 {
        return Err(AppError::Validation("limit must not be negative".to_string()));
    }
    let page = params.offset.unwrap_or(1);
    if page < 1 {
        return Err(AppError::Validation("offset starts at 1".to_string()));
    }
    let skip = limit
        .checked_mul(page - 1)
        .ok_or_else(|| AppError::Validation("offset is out of range".to_string()))?;

    let min_size = params.min_size.unwrap_or(DEFAULT_MIN_SIZE);
    let mut max_size = params.max_size.unwrap_or(DEFAULT_MAX_SIZE);
    // Upper bound is half-open on bucket boundaries: 70 stays in bucket 7.
    if max_size % 10 == 0 {
        max_size -= 1;
    }

    let sort = match params.sort.as_deref() {
        Some(raw) if !raw.is_empty() => SortKey::parse(raw),
        _ => SortKey::parse(DEFAULT_SORT),
    };

    Ok(FeedQuery {
        facets: FacetFilter {
            housing_type_id: params.housing_type,
            back_color_id: params.back_color,
            item_color_id: params.item_color,
            style_id: params.style,
        },
        min_bucket: size_to_bucket(min_size),
        max_bucket: size_to_bucket(max_size),
        sort,
        skip,
        limit,
    })
}

/// One feed card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedItem {
    pub id: i64,
    #[serde(rename = "profileImage")]
    pub author_profile_image: Option<String>,
    #[serde(rename = "profileName")]
    pub author_nickname: String,
    #[serde(rename = "introduce")]
    pub author_introduction: Option<String>,
    pub title: String,
    #[serde(rename = "cardImage")]
    pub card_image: String,
    #[serde(rename = "viewCount")]
    pub view_count: i64,
    #[serde(rename = "heartCount")]
    pub like_count: i64,
    #[serde(rename = "commentCount")]
    pub comment_count: i64,
    #[serde(rename = "writerImage")]
    pub writer_image: String,
    #[serde(rename = "writerName")]
    pub writer_nickname: String,
    #[serde(rename = "commentContent")]
    pub comment_preview: String,
    /// Present only when the caller has an identity
    #[serde(rename = "isLiked", skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
}

/// Batch-loaded data joined onto a page of postings
#[derive(Debug, Default)]
pub struct FeedSources {
    pub authors: HashMap<i64, User>,
    pub like_counts: HashMap<i64, i64>,
    pub comment_counts: HashMap<i64, i64>,
    pub previews: HashMap<i64, CommentPreview>,
    /// Postings the caller liked; `None` for anonymous callers
    pub liked_by_viewer: Option<HashSet<i64>>,
}

/// Join a page of postings with their derived fields. Read-only.
///
/// The comment preview is the earliest comment of each posting. A posting
/// without comments gets empty strings for all three preview fields.
pub fn aggregate(postings: Vec<Posting>, sources: &FeedSources) -> Vec<FeedItem> {
    postings
        .into_iter()
        .map(|posting| {
            let author = sources.authors.get(&posting.user_id);
            let preview = sources.previews.get(&posting.id);

            FeedItem {
                id: posting.id,
                author_profile_image: author.and_then(|a| a.profile_image.clone()),
                author_nickname: author.map(|a| a.nickname.clone()).unwrap_or_default(),
                author_introduction: author.and_then(|a| a.introduction.clone()),
                title: posting.text,
                card_image: posting.image,
                view_count: posting.view_count,
                like_count: sources.like_counts.get(&posting.id).copied().unwrap_or(0),
                comment_count: sources.comment_counts.get(&posting.id).copied().unwrap_or(0),
                writer_image: preview
                    .and_then(|p| p.author_image.clone())
                    .unwrap_or_default(),
                writer_nickname: preview
                    .map(|p| p.author_nickname.clone())
                    .unwrap_or_default(),
                comment_preview: preview.map(|p| p.text.clone()).unwrap_or_default(),
                is_liked: sources
                    .liked_by_viewer
                    .as_ref()
                    .map(|liked| liked.contains(&posting.id)),
            }
        })
        .collect()
}

pub struct FeedService {
    db: Arc<Database>,
}

impl FeedService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Plan, fetch and aggregate one feed page
    pub async fn feed(
        &self,
        params: &FeedParams,
        viewer: Option<&User>,
    ) -> Result<Vec<FeedItem>, AppError> {
        let query = plan(params)?;
        let postings = self.db.query_postings(&query).await?;
        if postings.is_empty() {
            return Ok(Vec::new());
        }

        let posting_ids: Vec<i64> = postings.iter().map(|p| p.id).collect();
        let mut author_ids: Vec<i64> = postings.iter().map(|p| p.user_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let (authors, like_counts, comment_counts, previews) = tokio::try_join!(
            self.db.get_users_by_ids(&author_ids),
            self.db.count_likes_by_posting(&posting_ids),
            self.db.count_comments_by_posting(&posting_ids),
            self.db.get_first_comments(&posting_ids),
        )?;

        let liked_by_viewer = match viewer {
            Some(user) => Some(self.db.get_liked_posting_ids(user.id, &posting_ids).await?),
            None => None,
        };

        tracing::debug!(
            count = postings.len(),
            skip = query.skip,
            personalized = viewer.is_some(),
            "Feed page assembled"
        );

        Ok(aggregate(
            postings,
            &FeedSources {
                authors,
                like_counts,
                comment_counts,
                previews,
                liked_by_viewer,
            },
        ))
    }
}
