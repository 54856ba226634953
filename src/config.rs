use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Upper bound for `JWT_TTL_MINUTES`: one year.
pub const MAX_TTL_MINUTES: i64 = 365 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Postgres URL; `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub store_timeout_secs: u64,
    pub host: String,
    pub port: u16,
}

impl JwtConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.secret.is_empty(), "JWT_SECRET must not be empty");
        anyhow::ensure!(
            (1..=MAX_TTL_MINUTES).contains(&self.ttl_minutes),
            "JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {}",
            self.ttl_minutes
        );
        Ok(())
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let jwt = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "movieshelf".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "movieshelf-users".into()),
            ttl_minutes: parse_or("JWT_TTL_MINUTES", 24 * 60),
        };
        jwt.validate()?;

        Ok(Self {
            database_url,
            jwt,
            store_timeout_secs: parse_or("STORE_TIMEOUT_SECS", 5),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_or("APP_PORT", 8080),
        })
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
