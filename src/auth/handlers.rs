use axum::{
    extract::{rejection::FormRejection, FromRef, State},
    response::{Html, Redirect},
    routing::{any, get},
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, info, instrument};

use crate::{
    auth::{
        dto::{LoginForm, NewAccount},
        services,
        session::{Session, SessionKeys},
    },
    error::AppError,
    pages::Page,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout).post(logout))
}

/// `/profile` answers every method; only the session decides.
pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profile", any(profile))
}

fn unreadable_form(rejection: FormRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

#[instrument(skip(state))]
pub async fn register_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    state.pages().render(Page::Register).await
}

#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    form: Result<Form<NewAccount>, FormRejection>,
) -> Result<Redirect, AppError> {
    let Form(input) = form.map_err(unreadable_form)?;
    let name = input.name.clone();

    let id = services::create_account(&state.db, input).await?;

    info!(account_id = id, name = %name, "account registered");
    Ok(Redirect::to("/login"))
}

#[instrument(skip(state))]
pub async fn login_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    state.pages().render(Page::Login).await
}

#[instrument(skip(state, jar, form))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<(CookieJar, Redirect), AppError> {
    let Form(form) = form.map_err(unreadable_form)?;

    let account = services::authenticate(&state.db, &form.name, &form.password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let keys = SessionKeys::from_ref(&state);
    let cookie = keys
        .issue(&account)
        .map_err(|e| AppError::Internal(format!("sign session: {e}")))?;

    info!(account_id = account.id, "account logged in");
    Ok((jar.add(cookie), Redirect::to("/profile")))
}

#[instrument(skip(state, jar))]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let keys = SessionKeys::from_ref(&state);
    if let Some(claims) = keys.claims(&jar) {
        info!(account_id = claims.sub, "account logged out");
    }
    (jar.remove(keys.clear()), Redirect::to("/login"))
}

#[instrument(skip(state, session))]
pub async fn profile(
    Session(session): Session,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    debug!(account_id = session.sub, "serving profile");
    state.pages().render(Page::Profile).await
}
