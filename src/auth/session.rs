use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::Redirect,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use crate::auth::repo_types::Account;
use crate::config::SessionConfig;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

/// Payload of the signed session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub sub: i32,     // account id
    pub name: String, // account name
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Signing material and cookie settings for sessions.
#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub ttl: Duration,
    pub secure: bool,
}

impl From<&SessionConfig> for SessionKeys {
    fn from(cfg: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            ttl: Duration::minutes(cfg.ttl_minutes),
            secure: cfg.cookie_secure,
        }
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        SessionKeys::from(&state.config.session)
    }
}

impl SessionKeys {
    fn sign_at(&self, account: &Account, now: OffsetDateTime) -> anyhow::Result<String> {
        let claims = SessionClaims {
            sub: account.id,
            name: account.name.clone(),
            iat: now.unix_timestamp(),
            exp: (now + self.ttl).unix_timestamp(),
            iss: self.issuer.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(account_id = account.id, "session signed");
        Ok(token)
    }

    /// Builds the `session` cookie for a freshly authenticated account.
    pub fn issue(&self, account: &Account) -> anyhow::Result<Cookie<'static>> {
        let token = self.sign_at(account, OffsetDateTime::now_utc())?;
        Ok(Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(self.ttl)
            .build())
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<SessionClaims> {
        let mut validation = Validation::default();
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.validate_aud = false;
        let data = decode::<SessionClaims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    /// Claims of the request's session cookie, if it carries a valid one.
    pub fn claims(&self, jar: &CookieJar) -> Option<SessionClaims> {
        let cookie = jar.get(SESSION_COOKIE)?;
        match self.verify(cookie.value()) {
            Ok(claims) => Some(claims),
            Err(e) => {
                warn!(error = %e, "rejected session cookie");
                None
            }
        }
    }

    pub fn is_authenticated(&self, jar: &CookieJar) -> bool {
        self.claims(jar).is_some()
    }

    /// Cookie to hand to `CookieJar::remove` on logout.
    pub fn clear(&self) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE).path("/").build()
    }
}

/// An authenticated request. Anonymous requests are redirected to `/login`.
pub struct Session(pub SessionClaims);

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        keys.claims(&jar)
            .map(Session)
            .ok_or_else(|| Redirect::to("/login"))
    }
}
