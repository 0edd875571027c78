use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection string. When present it wins over the individual parts.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        if let Some(url) = &self.url {
            return url.parse();
        }
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub ttl_minutes: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub static_dir: PathBuf,
    pub max_submission_bytes: usize,
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let server = ServerConfig {
            host: var_or("APP_HOST", "0.0.0.0"),
            port: parsed_or("APP_PORT", 8080),
        };
        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL").ok(),
            host: var_or("DB_HOST", "localhost"),
            port: parsed_or("DB_PORT", 5432),
            user: var_or("DB_USER", "postgres"),
            password: var_or("DB_PASSWORD", ""),
            name: var_or("DB_NAME", "syrma20"),
            max_connections: parsed_or("DB_MAX_CONNECTIONS", 10),
            acquire_timeout_secs: parsed_or("DB_ACQUIRE_TIMEOUT_SECS", 5),
        };
        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET").context("SESSION_SECRET must be set")?,
            issuer: var_or("SESSION_ISSUER", "syrma"),
            ttl_minutes: parsed_or("SESSION_TTL_MINUTES", 60 * 24),
            cookie_secure: parsed_or("SESSION_COOKIE_SECURE", false),
        };
        Ok(Self {
            server,
            database,
            session,
            static_dir: PathBuf::from(var_or("STATIC_DIR", "static")),
            max_submission_bytes: parsed_or("MAX_SUBMISSION_BYTES", 1024 * 1024),
        })
    }
}
