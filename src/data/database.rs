//! SQLite database operations
//!
//! All database access goes through this module.
//! Uses SQLx with runtime-checked queries.

use chrono::Utc;
use sqlx::{Pool, QueryBuilder, Sqlite, SqlitePool};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Map a caller-facing sort field to its column.
///
/// Field names follow the public API (`create_at`, `view`, ...), not the
/// column names.
fn sort_column(field: &str) -> Option<&'static str> {
    match field {
        "create_at" | "created_at" => Some("created_at"),
        "update_at" | "updated_at" => Some("updated_at"),
        "view" | "view_count" => Some("view_count"),
        "id" => Some("id"),
        "text" => Some("text"),
        "housing_type" => Some("housing_type_id"),
        "size" => Some("size_id"),
        "style" => Some("style_id"),
        _ => None,
    }
}

/// Push `(?, ?, ...)` binding each id.
fn push_id_list(query_builder: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    query_builder.push("(");
    {
        let mut separated = query_builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
    }
    query_builder.push(")");
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically, which also seed the
    /// facet lookup tables.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Create a user and return the stored row
    pub async fn insert_user(&self, user: &NewUser) -> Result<User, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (kakao_id, email, nickname, profile_image, is_deleted, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&user.kakao_id)
        .bind(&user.email)
        .bind(&user.nickname)
        .bind(&user.profile_image)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_user(id).await?.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("user {} missing after insert", id))
        })
    }

    /// Get a user by id, including soft-deleted rows
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get a user by id, skipping soft-deleted rows
    pub async fn get_active_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ? AND is_deleted = 0")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get the first user registered under a provider account id
    pub async fn get_user_by_kakao_id(&self, kakao_id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE kakao_id = ? ORDER BY id ASC LIMIT 1",
        )
        .bind(kakao_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Batch-load users by id
    pub async fn get_users_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, User>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query_builder = QueryBuilder::<Sqlite>::new("SELECT * FROM users WHERE id IN ");
        push_id_list(&mut query_builder, ids);

        let users = query_builder
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await?;

        Ok(users.into_iter().map(|user| (user.id, user)).collect())
    }

    /// Check whether any user has exactly this nickname
    pub async fn nickname_exists(&self, nickname: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE nickname = ?")
            .bind(nickname)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Nicknames starting with `prefix` (case-sensitive, no wildcards)
    pub async fn get_nicknames_with_prefix(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        let nicknames = sqlx::query_scalar::<_, String>(
            "SELECT nickname FROM users WHERE substr(nickname, 1, length(?)) = ?",
        )
        .bind(prefix)
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        Ok(nicknames)
    }

    #[cfg(test)]
    pub async fn mark_user_deleted_for_test(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET is_deleted = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Facets
    // =========================================================================

    /// Find a facet row by its label
    pub async fn find_facet_by_label(
        &self,
        kind: FacetKind,
        label: &str,
    ) -> Result<Option<Facet>, AppError> {
        let sql = format!("SELECT id, label FROM {} WHERE label = ?", kind.table());
        let facet = sqlx::query_as::<_, Facet>(&sql)
            .bind(label)
            .fetch_optional(&self.pool)
            .await?;

        Ok(facet)
    }

    // =========================================================================
    // Postings
    // =========================================================================

    /// Insert posting and return its id
    pub async fn insert_posting(&self, posting: &NewPosting) -> Result<i64, AppError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO postings (
                user_id, housing_type_id, size_id, style_id, item_color_id, back_color_id,
                image, text, view_count, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(posting.user_id)
        .bind(posting.housing_type_id)
        .bind(posting.size_id)
        .bind(posting.style_id)
        .bind(posting.item_color_id)
        .bind(posting.back_color_id)
        .bind(&posting.image)
        .bind(&posting.text)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Get posting by ID
    pub async fn get_posting(&self, id: i64) -> Result<Option<Posting>, AppError> {
        let posting = sqlx::query_as::<_, Posting>("SELECT * FROM postings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(posting)
    }

    /// Check whether a posting exists
    pub async fn posting_exists(&self, id: i64) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM postings WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Run a normalized feed query
    ///
    /// # Errors
    /// `Validation` when the sort field has no backing column
    pub async fn query_postings(&self, query: &FeedQuery) -> Result<Vec<Posting>, AppError> {
        let column = sort_column(&query.sort.field).ok_or_else(|| {
            AppError::Validation(format!("unknown sort field: {}", query.sort.field))
        })?;
        let direction = if query.sort.descending { "DESC" } else { "ASC" };

        let mut query_builder =
            QueryBuilder::<Sqlite>::new("SELECT * FROM postings WHERE size_id BETWEEN ");
        query_builder.push_bind(query.min_bucket);
        query_builder.push(" AND ");
        query_builder.push_bind(query.max_bucket);

        let facets = &query.facets;
        for (filter_column, value) in [
            ("housing_type_id", facets.housing_type_id),
            ("back_color_id", facets.back_color_id),
            ("item_color_id", facets.item_color_id),
            ("style_id", facets.style_id),
        ] {
            if let Some(value) = value {
                query_builder.push(format!(" AND {} = ", filter_column));
                query_builder.push_bind(value);
            }
        }

        query_builder.push(format!(" ORDER BY {} {}, id ASC", column, direction));
        query_builder.push(" LIMIT ");
        query_builder.push_bind(query.limit);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(query.skip);

        let postings = query_builder
            .build_query_as::<Posting>()
            .fetch_all(&self.pool)
            .await?;

        Ok(postings)
    }

    /// Atomically increment a posting's view counter
    ///
    /// # Returns
    /// The counter after the increment, or None if the posting is absent
    pub async fn increment_view_count(&self, id: i64) -> Result<Option<i64>, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE postings SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let view_count =
            sqlx::query_scalar::<_, i64>("SELECT view_count FROM postings WHERE id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        tx.commit().await?;

        Ok(Some(view_count))
    }

    /// Posting joined with facet labels, author and like count
    pub async fn get_posting_detail(&self, id: i64) -> Result<Option<PostingDetailRow>, AppError> {
        let row = sqlx::query_as::<_, PostingDetailRow>(
            r#"
            SELECT
                p.id, p.image, p.text, p.view_count,
                s.label AS size_label,
                st.label AS style_label,
                h.label AS housing_type_label,
                (SELECT COUNT(*) FROM likes l WHERE l.posting_id = p.id) AS like_count,
                u.id AS author_id,
                u.nickname AS author_nickname,
                u.profile_image AS author_profile_image,
                u.introduction AS author_introduction
            FROM postings p
            INNER JOIN sizes s ON s.id = p.size_id
            INNER JOIN styles st ON st.id = p.style_id
            INNER JOIN housing_types h ON h.id = p.housing_type_id
            INNER JOIN users u ON u.id = p.user_id
            WHERE p.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Image URLs of a user's postings, oldest first
    pub async fn get_posting_images_by_user(&self, user_id: i64) -> Result<Vec<String>, AppError> {
        let images = sqlx::query_scalar::<_, String>(
            "SELECT image FROM postings WHERE user_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Insert a like unless the pair already exists
    ///
    /// Relies on the UNIQUE(user_id, posting_id) index, so concurrent
    /// duplicates cannot both succeed.
    ///
    /// # Returns
    /// `true` if inserted, `false` if the pair was already liked
    pub async fn insert_like(&self, user_id: i64, posting_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO likes (user_id, posting_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(posting_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a like
    ///
    /// # Returns
    /// `true` if a row was removed
    pub async fn delete_like(&self, user_id: i64, posting_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = ? AND posting_id = ?")
            .bind(user_id)
            .bind(posting_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of likes a user has given
    pub async fn count_likes_by_user(&self, user_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Like counts keyed by posting id; postings without likes are absent
    pub async fn count_likes_by_posting(
        &self,
        posting_ids: &[i64],
    ) -> Result<HashMap<i64, i64>, AppError> {
        self.count_grouped("likes", posting_ids).await
    }

    /// Posting ids among `posting_ids` the user has liked
    pub async fn get_liked_posting_ids(
        &self,
        user_id: i64,
        posting_ids: &[i64],
    ) -> Result<HashSet<i64>, AppError> {
        if posting_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let mut query_builder =
            QueryBuilder::<Sqlite>::new("SELECT posting_id FROM likes WHERE user_id = ");
        query_builder.push_bind(user_id);
        query_builder.push(" AND posting_id IN ");
        push_id_list(&mut query_builder, posting_ids);

        let ids = query_builder
            .build_query_scalar::<i64>()
            .fetch_all(&self.pool)
            .await?;

        Ok(ids.into_iter().collect())
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Insert comment and return its id
    pub async fn insert_comment(&self, comment: &NewComment) -> Result<i64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO comments (posting_id, user_id, parent_id, text, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(comment.posting_id)
        .bind(comment.user_id)
        .bind(comment.parent_id)
        .bind(&comment.text)
        .bind(comment.created_at)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Get comment by ID
    pub async fn get_comment(&self, id: i64) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    /// Comments of a posting, newest first
    pub async fn list_comments(
        &self,
        posting_id: i64,
        limit: i64,
        skip: i64,
    ) -> Result<Vec<CommentWithAuthor>, AppError> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT
                c.id, c.text, c.created_at,
                u.id AS user_id,
                u.nickname AS user_nickname,
                u.profile_image AS user_profile
            FROM comments c
            INNER JOIN users u ON u.id = c.user_id
            WHERE c.posting_id = ?
            ORDER BY c.created_at DESC, c.id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(posting_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    /// Replace comment text
    ///
    /// # Returns
    /// `true` if the comment existed
    pub async fn update_comment_text(&self, id: i64, text: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE comments SET text = ?, updated_at = ? WHERE id = ?")
            .bind(text)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete comment (replies cascade)
    ///
    /// # Returns
    /// `true` if the comment existed
    pub async fn delete_comment(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Comment counts keyed by posting id; postings without comments are absent
    pub async fn count_comments_by_posting(
        &self,
        posting_ids: &[i64],
    ) -> Result<HashMap<i64, i64>, AppError> {
        self.count_grouped("comments", posting_ids).await
    }

    /// Earliest comment of each posting with its author
    ///
    /// Ordered by creation time ascending, ties broken by id.
    pub async fn get_first_comments(
        &self,
        posting_ids: &[i64],
    ) -> Result<HashMap<i64, CommentPreview>, AppError> {
        if posting_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query_builder = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT posting_id, author_image, author_nickname, text FROM (
                SELECT
                    c.posting_id,
                    u.profile_image AS author_image,
                    u.nickname AS author_nickname,
                    c.text,
                    ROW_NUMBER() OVER (
                        PARTITION BY c.posting_id ORDER BY c.created_at ASC, c.id ASC
                    ) AS rn
                FROM comments c
                INNER JOIN users u ON u.id = c.user_id
                WHERE c.posting_id IN "#,
        );
        push_id_list(&mut query_builder, posting_ids);
        query_builder.push(") WHERE rn = 1");

        let previews = query_builder
            .build_query_as::<CommentPreview>()
            .fetch_all(&self.pool)
            .await?;

        Ok(previews
            .into_iter()
            .map(|preview| (preview.posting_id, preview))
            .collect())
    }

    async fn count_grouped(
        &self,
        table: &'static str,
        posting_ids: &[i64],
    ) -> Result<HashMap<i64, i64>, AppError> {
        if posting_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query_builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT posting_id, COUNT(*) FROM {} WHERE posting_id IN ",
            table
        ));
        push_id_list(&mut query_builder, posting_ids);
        query_builder.push(" GROUP BY posting_id");

        let counts = query_builder
            .build_query_as::<(i64, i64)>()
            .fetch_all(&self.pool)
            .await?;

        Ok(counts.into_iter().collect())
    }
}
