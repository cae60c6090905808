//! Comment service

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::data::{CommentWithAuthor, Database, NewComment, User};
use crate::error::AppError;

pub const DEFAULT_COMMENT_LIMIT: i64 = 5;

/// Comment list item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub text: String,
    /// Creation date, `YYYY-MM-DD`
    pub create_at: String,
    pub user_id: i64,
    pub user_nickname: String,
    pub user_profile: Option<String>,
}

impl From<CommentWithAuthor> for CommentView {
    fn from(row: CommentWithAuthor) -> Self {
        Self {
            id: row.id,
            text: row.text,
            create_at: row.created_at.format("%Y-%m-%d").to_string(),
            user_id: row.user_id,
            user_nickname: row.user_nickname,
            user_profile: row.user_profile,
        }
    }
}

pub struct CommentService {
    db: Arc<Database>,
}

impl CommentService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// One page of a posting's comments, newest first
    ///
    /// `page` is 1-indexed. An unknown posting yields an empty page.
    pub async fn list(
        &self,
        posting_id: i64,
        limit: i64,
        page: i64,
    ) -> Result<Vec<CommentView>, AppError> {
        if limit < 0 {
            return Err(AppError::Validation("limit must not be negative".to_string()));
        }
        if page < 1 {
            return Err(AppError::Validation("offset starts at 1".to_string()));
        }
        let skip = limit
            .checked_mul(page - 1)
            .ok_or_else(|| AppError::Validation("offset is out of range".to_string()))?;

        let rows = self.db.list_comments(posting_id, limit, skip).await?;
        Ok(rows.into_iter().map(CommentView::from).collect())
    }

    /// Write a comment
    ///
    /// # Errors
    /// `InvalidPostingId` if the posting does not exist, `Validation` if
    /// `parent_id` names a comment on another posting
    pub async fn create(
        &self,
        author: &User,
        posting_id: i64,
        text: String,
        parent_id: Option<i64>,
    ) -> Result<i64, AppError> {
        if !self.db.posting_exists(posting_id).await? {
            return Err(AppError::InvalidPostingId);
        }
        if let Some(parent_id) = parent_id {
            let parent = self.db.get_comment(parent_id).await?;
            if parent.map(|c| c.posting_id) != Some(posting_id) {
                return Err(AppError::Validation(format!(
                    "parent comment {parent_id} is not on posting {posting_id}"
                )));
            }
        }

        let comment_id = self
            .db
            .insert_comment(&NewComment {
                posting_id,
                user_id: author.id,
                parent_id,
                text,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(comment_id, posting_id, user_id = author.id, "Comment created");
        Ok(comment_id)
    }

    /// Replace a comment's text
    ///
    /// Any signed-in user may edit any comment.
    pub async fn update(&self, editor: &User, comment_id: i64, text: &str) -> Result<(), AppError> {
        if !self.db.update_comment_text(comment_id, text).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(comment_id, user_id = editor.id, "Comment updated");
        Ok(())
    }

    /// Delete a comment and its replies
    pub async fn delete(&self, editor: &User, comment_id: i64) -> Result<(), AppError> {
        if !self.db.delete_comment(comment_id).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(comment_id, user_id = editor.id, "Comment deleted");
        Ok(())
    }
}
