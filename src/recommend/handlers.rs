use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::instrument;

use super::dto::{RecommendRequest, RecommendationItem};
use crate::{error::ApiError, state::AppState};

pub fn recommend_routes() -> Router<AppState> {
    Router::new().route("/recommend", post(recommend))
}

/// Any integer user id is accepted; unknown users get fallback ratings.
#[instrument(skip(state, payload))]
pub async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<Vec<RecommendationItem>>, ApiError> {
    let Json(payload) = payload?;
    Ok(Json(state.recommender.recommend(payload.user_id())))
}
