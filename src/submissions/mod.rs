pub mod handlers;
pub mod repo;

use crate::state::AppState;
use axum::Router;

pub fn router(max_body_bytes: usize) -> Router<AppState> {
    handlers::submission_routes(max_body_bytes)
}
