//! User endpoints: sign-in, signup, nickname check and account summary

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};

use super::dto::{ApiJson, MessageResponse, NicknameCheckRequest, NicknameTakenResponse};
use crate::AppState;
use crate::auth::{CurrentUser, credential_from_headers};
use crate::error::AppError;
use crate::service::{
    AccountService, AccountSummary, Availability, NicknameResolver, SigninResult, SignupRequest,
};

pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/users", get(account_summary))
        .route("/users/signin", post(signin))
        .route("/users/signup", post(signup))
        .route("/users/nickname-check", post(nickname_check))
}

fn build_account_service(state: &AppState) -> AccountService {
    AccountService::new(
        state.db.clone(),
        state.token_codec.clone(),
        state.oauth.clone(),
        state.mailer.clone(),
    )
}

/// POST /users/signin
///
/// `Authorization` carries the provider access token, not a self token.
async fn signin(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SigninResult>, AppError> {
    let access_token = credential_from_headers(&headers).ok_or(AppError::MissingCredential)?;
    let result = build_account_service(&state).signin(&access_token).await?;
    Ok(Json(result))
}

/// POST /users/signup
async fn signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = build_account_service(&state).signup(request).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// POST /users/nickname-check
async fn nickname_check(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<NicknameCheckRequest>,
) -> Result<Response, AppError> {
    let availability = NicknameResolver::new(state.db.clone())
        .check_availability(&request.nickname)
        .await?;

    let response = match availability {
        Availability::Available => Json(MessageResponse::new("SUCCESS")).into_response(),
        Availability::Taken { suggestion } => (
            StatusCode::BAD_REQUEST,
            Json(NicknameTakenResponse {
                message: "NICKNAME_ALREADY_EXISTS",
                recommend_nickname: suggestion,
            }),
        )
            .into_response(),
    };

    Ok(response)
}

/// GET /users
async fn account_summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<AccountSummary>, AppError> {
    let summary = build_account_service(&state).summary(&user).await?;
    Ok(Json(summary))
}
