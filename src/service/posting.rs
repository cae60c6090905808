//! Posting service
//!
//! Detail assembly, posting creation and likes.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data::{Database, FacetKind, NewPosting, User};
use crate::error::AppError;
use crate::metrics::{LIKES_TOTAL, POSTING_VIEWS_TOTAL};
use crate::storage::ObjectStore;

/// Author block of the detail view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorSummary {
    pub id: i64,
    pub nickname: String,
    pub image_url: Option<String>,
    pub introduction: Option<String>,
}

/// Single-posting view model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostingDetail {
    pub id: i64,
    pub image: String,
    pub text: String,
    /// Size facet label
    pub size: String,
    pub style: String,
    /// Like count
    pub like: i64,
    pub housing_type: String,
    /// View count including this fetch
    pub view: i64,
    pub author: AuthorSummary,
}

/// `info` part of the posting upload; facets are given by label
#[derive(Debug, Clone, Deserialize)]
pub struct PostingInfo {
    pub housing_type: String,
    pub size: String,
    pub style: String,
    pub back_color: String,
    pub item_color: String,
    pub text: String,
}

/// Uploaded image bytes and their MIME type
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub data: Vec<u8>,
    pub content_type: String,
}

pub struct PostingService {
    db: Arc<Database>,
    storage: Arc<dyn ObjectStore>,
}

impl PostingService {
    pub fn new(db: Arc<Database>, storage: Arc<dyn ObjectStore>) -> Self {
        Self { db, storage }
    }

    /// Assemble the detail view, counting this fetch as a view
    ///
    /// Every successful call increments the counter by exactly one.
    ///
    /// # Errors
    /// `NotFound` if the posting does not exist
    pub async fn detail(&self, posting_id: i64) -> Result<PostingDetail, AppError> {
        let view = self
            .db
            .increment_view_count(posting_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let row = self
            .db
            .get_posting_detail(posting_id)
            .await?
            .ok_or(AppError::NotFound)?;

        POSTING_VIEWS_TOTAL.inc();
        tracing::debug!(posting_id, view, "Posting viewed");

        Ok(PostingDetail {
            id: row.id,
            image: row.image,
            text: row.text,
            size: row.size_label,
            style: row.style_label,
            like: row.like_count,
            housing_type: row.housing_type_label,
            view,
            author: AuthorSummary {
                id: row.author_id,
                nickname: row.author_nickname,
                image_url: row.author_profile_image,
                introduction: row.author_introduction,
            },
        })
    }

    /// Store the image and write the posting
    ///
    /// Labels are resolved before the upload so a bad label never leaves
    /// an orphaned object behind.
    ///
    /// # Errors
    /// `Validation` for an unknown facet label or unsupported image type
    pub async fn create(
        &self,
        author: &User,
        info: PostingInfo,
        image: ImageUpload,
    ) -> Result<i64, AppError> {
        let housing_type_id = self
            .facet_id(FacetKind::HousingType, &info.housing_type)
            .await?;
        let size_id = self.facet_id(FacetKind::Size, &info.size).await?;
        let style_id = self.facet_id(FacetKind::Style, &info.style).await?;
        let back_color_id = self.facet_id(FacetKind::Color, &info.back_color).await?;
        let item_color_id = self.facet_id(FacetKind::Color, &info.item_color).await?;

        let image_url = self.storage.store(image.data, &image.content_type).await?;

        let posting_id = self
            .db
            .insert_posting(&NewPosting {
                user_id: author.id,
                housing_type_id,
                size_id,
                style_id,
                item_color_id,
                back_color_id,
                image: image_url,
                text: info.text,
            })
            .await?;

        tracing::info!(posting_id, user_id = author.id, "Posting created");
        Ok(posting_id)
    }

    /// Like a posting
    ///
    /// # Errors
    /// - `NotFound` if the posting does not exist
    /// - `Conflict` if the user already liked it
    pub async fn like(&self, user: &User, posting_id: i64) -> Result<(), AppError> {
        if !self.db.posting_exists(posting_id).await? {
            return Err(AppError::NotFound);
        }
        if !self.db.insert_like(user.id, posting_id).await? {
            return Err(AppError::Conflict("posting already liked".to_string()));
        }

        LIKES_TOTAL.with_label_values(&["like"]).inc();
        tracing::info!(posting_id, user_id = user.id, "Posting liked");
        Ok(())
    }

    /// Remove the user's like
    ///
    /// # Errors
    /// `NotFound` if the user had not liked the posting
    pub async fn unlike(&self, user: &User, posting_id: i64) -> Result<(), AppError> {
        if !self.db.delete_like(user.id, posting_id).await? {
            return Err(AppError::NotFound);
        }

        LIKES_TOTAL.with_label_values(&["unlike"]).inc();
        tracing::info!(posting_id, user_id = user.id, "Posting unliked");
        Ok(())
    }

    async fn facet_id(&self, kind: FacetKind, label: &str) -> Result<i64, AppError> {
        self.db
            .find_facet_by_label(kind, label)
            .await?
            .map(|facet| facet.id)
            .ok_or_else(|| AppError::Validation(format!("unknown {}: {}", kind.table(), label)))
    }
}
