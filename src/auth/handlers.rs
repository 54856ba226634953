use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, SignupRequest},
        extractors::AuthUser,
        services::{LoginOutcome, SignupOutcome},
    },
    error::{AppError, AppResult},
    response::ApiResponse,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users/signup", post(signup))
        .route("/users/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> AppResult<Json<AuthResponse>> {
    let Json(payload) = payload?;

    match state.auth.signup(payload).await? {
        SignupOutcome::Created(_) => Ok(Json(AuthResponse {
            success: true,
            message: "User created successfully".into(),
            token: None,
        })),
        SignupOutcome::Invalid(errors) => Err(AppError::Validation(errors)),
        SignupOutcome::EmailTaken => Err(AppError::bad_request("Email already exists")),
        SignupOutcome::UsernameTaken => Err(AppError::bad_request("Username already exists")),
        SignupOutcome::AlreadyExists => Err(AppError::bad_request("User already exists")),
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<AuthResponse>> {
    let Json(payload) = payload?;

    match state.auth.login(payload).await? {
        LoginOutcome::Authenticated { token, .. } => Ok(Json(AuthResponse {
            success: true,
            message: "Login successful".into(),
            token: Some(token),
        })),
        LoginOutcome::InvalidCredentials => {
            Err(AppError::Unauthorized("Invalid email or password".into()))
        }
    }
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<ApiResponse<PublicUser>>> {
    let user = state
        .auth
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    Ok(Json(ApiResponse::ok(
        "User retrieved successfully",
        PublicUser::from(user),
    )))
}
