use anyhow::{bail, Context};
use serde::Deserialize;

/// Upper bound for both session lifetimes: ten years.
pub const MAX_TTL_MINUTES: i64 = 525_600 * 10;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub remember_ttl_minutes: i64,
    pub cookie_secure: bool,
}

/// Credentials for the administrator created on first start.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub admin_seed: Option<AdminSeed>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET")?,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "volunteermatching".into()),
            audience: std::env::var("SESSION_AUDIENCE")
                .unwrap_or_else(|_| "volunteermatching-web".into()),
            ttl_minutes: ttl_minutes(
                "SESSION_TTL_MINUTES",
                std::env::var("SESSION_TTL_MINUTES").ok().as_deref(),
                60,
            )?,
            remember_ttl_minutes: ttl_minutes(
                "SESSION_REMEMBER_TTL_MINUTES",
                std::env::var("SESSION_REMEMBER_TTL_MINUTES").ok().as_deref(),
                60 * 24 * 14,
            )?,
            cookie_secure: std::env::var("SESSION_COOKIE_SECURE")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        };
        let admin_seed = match (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(AdminSeed { email, password }),
            _ => None,
        };
        Ok(Self {
            database_url,
            session,
            admin_seed,
        })
    }
}

/// Parses a lifetime in minutes, falling back to `default` when unset.
fn ttl_minutes(var: &str, raw: Option<&str>, default: i64) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let minutes = raw
        .trim()
        .parse::<i64>()
        .with_context(|| format!("{var} must be a whole number of minutes"))?;
    if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
        bail!("{var} must be between 1 and {MAX_TTL_MINUTES} minutes, got {minutes}");
    }
    Ok(minutes)
}
