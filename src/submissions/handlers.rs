use axum::{
    extract::{rejection::StringRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use tracing::{info, instrument};

use super::repo::SubmittedCode;
use crate::{error::AppError, pages::Page, state::AppState};

pub const SUBMITTED: &str = "Code submitted successfully";

pub fn submission_routes(max_body_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/compile", get(compile_page).post(submit_code))
        .layer(DefaultBodyLimit::max(max_body_bytes))
}

#[instrument(skip(state))]
pub async fn compile_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    state.pages().render(Page::Compile).await
}

/// POST /compile
/// The raw body is the submission; nothing is compiled or run.
#[instrument(skip(state, body))]
pub async fn submit_code(
    State(state): State<AppState>,
    body: Result<String, StringRejection>,
) -> Result<&'static str, AppError> {
    let code = body.map_err(|rejection| match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge,
        _ => AppError::BadRequest(rejection.body_text()),
    })?;

    let id = SubmittedCode::insert(&state.db, &code).await?;

    info!(submission_id = id, bytes = code.len(), "code submitted");
    Ok(SUBMITTED)
}
