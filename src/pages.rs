use std::path::{Path, PathBuf};

use axum::{extract::State, response::Html};
use tracing::instrument;

use crate::{error::AppError, state::AppState};

/// Static views, served verbatim from the configured directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Welcome,
    Register,
    Login,
    Profile,
    Compile,
}

impl Page {
    pub fn file_name(self) -> &'static str {
        match self {
            Page::Welcome => "welcome.html",
            Page::Register => "register.html",
            Page::Login => "login.html",
            Page::Profile => "profile.html",
            Page::Compile => "compile.html",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pages {
    dir: PathBuf,
}

impl Pages {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_of(&self, page: Page) -> PathBuf {
        self.dir.join(page.file_name())
    }

    pub async fn render(&self, page: Page) -> Result<Html<String>, AppError> {
        let path = self.path_of(page);
        read_page(&path).await.map(Html)
    }
}

async fn read_page(path: &Path) -> Result<String, AppError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::Internal(format!("cannot read {}: {e}", path.display())))
}

#[instrument(skip(state))]
pub async fn welcome(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    state.pages().render(Page::Welcome).await
}
