use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{CredentialsRequest, LoginResponse, MessageResponse, PublicUser},
        extractors::AuthUser,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(payload) = payload?;
    state
        .auth
        .signup(payload.email(), payload.password())
        .await?;
    Ok(Json(MessageResponse {
        message: "User created".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload?;
    let access_token = state
        .auth
        .login(payload.email(), payload.password())
        .await?;
    Ok(Json(LoginResponse { access_token }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    Ok(Json(state.auth.current_user(user_id).await?))
}
