//! Posting endpoints

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};

use super::dto::{ApiPath, ApiQuery, FeedResponse, MessageResponse, PostingDetailResponse};
use crate::AppState;
use crate::auth::{CurrentUser, MaybeUser};
use crate::error::AppError;
use crate::service::{FeedParams, FeedService, ImageUpload, PostingInfo, PostingService};
use crate::storage::extension_for;

pub const MAX_IMAGE_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Multipart framing on top of the image itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn postings_router() -> Router<AppState> {
    Router::new()
        .route("/postings", get(list_postings).post(create_posting))
        .route("/postings/:id", get(get_posting))
        .route("/postings/like/:id", post(like_posting).delete(unlike_posting))
        .layer(DefaultBodyLimit::max(
            MAX_IMAGE_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES,
        ))
}

fn build_posting_service(state: &AppState) -> PostingService {
    PostingService::new(state.db.clone(), state.storage.clone())
}

/// GET /postings
async fn list_postings(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    ApiQuery(params): ApiQuery<FeedParams>,
) -> Result<Json<FeedResponse>, AppError> {
    let result = FeedService::new(state.db.clone())
        .feed(&params, viewer.as_ref())
        .await?;

    Ok(Json(FeedResponse { result }))
}

/// POST /postings
///
/// Multipart form with an `image` file part and an `info` JSON part.
async fn create_posting(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let mut multipart = multipart?;
    let mut image: Option<ImageUpload> = None;
    let mut info: Option<PostingInfo> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to parse multipart: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "image" => {
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AppError::Validation("Missing content type for image".to_string())
                    })?;
                if extension_for(&content_type).is_none() {
                    return Err(AppError::Validation(format!(
                        "Unsupported image type: {}",
                        content_type
                    )));
                }

                let mut data = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read image: {}", e)))?
                {
                    if data.len() + chunk.len() > MAX_IMAGE_UPLOAD_BYTES {
                        return Err(AppError::Validation(format!(
                            "Image too large: exceeds {} bytes",
                            MAX_IMAGE_UPLOAD_BYTES
                        )));
                    }
                    data.extend_from_slice(&chunk);
                }
                if data.is_empty() {
                    return Err(AppError::Validation("Image is empty".to_string()));
                }

                image = Some(ImageUpload { data, content_type });
            }
            "info" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read info: {}", e)))?;
                info = Some(
                    serde_json::from_str(&raw)
                        .map_err(|e| AppError::Validation(format!("info: {}", e)))?,
                );
            }
            _ => {}
        }
    }

    let image = image.ok_or_else(|| AppError::Validation("No image provided".to_string()))?;
    let info = info.ok_or_else(|| AppError::Validation("No info provided".to_string()))?;

    build_posting_service(&state).create(&user, info, image).await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::new("SUCCESS"))))
}

/// GET /postings/:id
///
/// Counts as a view.
async fn get_posting(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<PostingDetailResponse>, AppError> {
    let posting = build_posting_service(&state).detail(id).await?;
    Ok(Json(PostingDetailResponse { posting }))
}

/// POST /postings/like/:id
async fn like_posting(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    build_posting_service(&state).like(&user, id).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::new("SUCCESS"))))
}

/// DELETE /postings/like/:id
async fn unlike_posting(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    build_posting_service(&state).unlike(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
