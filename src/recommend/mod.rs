use crate::state::AppState;
use axum::Router;

pub mod catalog;
pub mod dto;
pub mod handlers;
pub mod model;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::recommend_routes()
}
