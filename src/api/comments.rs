//! Comment endpoints

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, patch},
};

use super::dto::{
    ApiJson, ApiPath, ApiQuery, CommentListQuery, CommentListResponse, CommentTargetQuery,
    CreateCommentRequest, MessageResponse, UpdateCommentRequest,
};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::service::{CommentService, DEFAULT_COMMENT_LIMIT};

pub fn comments_router() -> Router<AppState> {
    Router::new()
        .route("/comments", get(list_comments).post(create_comment))
        .route("/comments/:id", patch(update_comment).delete(delete_comment))
}

/// GET /comments?posting_id=&limit=&offset=
async fn list_comments(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CommentListQuery>,
) -> Result<Json<CommentListResponse>, AppError> {
    let comment = CommentService::new(state.db.clone())
        .list(
            query.posting_id.unwrap_or(0),
            query.limit.unwrap_or(DEFAULT_COMMENT_LIMIT),
            query.offset.unwrap_or(1),
        )
        .await?;

    Ok(Json(CommentListResponse { comment }))
}

/// POST /comments?posting_id=
async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(target): ApiQuery<CommentTargetQuery>,
    ApiJson(body): ApiJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let posting_id = target.posting_id()?;

    CommentService::new(state.db.clone())
        .create(&user, posting_id, body.text, body.parent_id)
        .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::new("CREATED"))))
}

/// PATCH /comments/:id
async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateCommentRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    CommentService::new(state.db.clone())
        .update(&user, id, &body.text)
        .await?;

    Ok(Json(MessageResponse::new("COMMENT_PATCH")))
}

/// DELETE /comments/:id
async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    CommentService::new(state.db.clone())
        .delete(&user, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
