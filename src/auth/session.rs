use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{header, HeaderMap, HeaderValue};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        repo::{DynSessionStore, DynUserStore},
        repo_types::{Session, User},
    },
    config::{SessionConfig, MAX_TTL_MINUTES},
};

pub const SESSION_COOKIE: &str = "session";

/// Payload of the signed session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user ID
    pub sid: Uuid, // server-side session row
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
    pub remember_ttl: Duration,
}

impl SessionKeys {
    pub fn from_config(cfg: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: ttl_from_minutes(cfg.ttl_minutes),
            remember_ttl: ttl_from_minutes(cfg.remember_ttl_minutes),
        }
    }

    fn sign(&self, user_id: Uuid, sid: Uuid, expires_at: OffsetDateTime) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user_id,
            sid,
            iat: now.unix_timestamp() as usize,
            exp: expires_at.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, sid = %sid, "session token signed");
        Ok(token)
    }

    fn verify(&self, token: &str, check_expiry: bool) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.validate_exp = check_expiry;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

/// Clamped to `1..=MAX_TTL_MINUTES`; `AppConfig::from_env` rejects values outside it.
fn ttl_from_minutes(minutes: i64) -> Duration {
    let minutes = minutes.clamp(1, MAX_TTL_MINUTES) as u64;
    Duration::from_secs(minutes.checked_mul(60).unwrap_or(u64::MAX))
}

/// Token handed to the client after login.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub value: String,
    /// Set for remember-me sessions so the cookie outlives the browser.
    pub max_age: Option<Duration>,
}

/// Starts, ends and resolves login sessions.
///
/// The client holds a signed token naming a session row; the row is what
/// makes the session live, so logout and revocation take effect at once.
#[derive(Clone)]
pub struct SessionManager {
    keys: Arc<SessionKeys>,
    sessions: DynSessionStore,
    users: DynUserStore,
    cookie_secure: bool,
}

impl SessionManager {
    pub fn new(cfg: &SessionConfig, sessions: DynSessionStore, users: DynUserStore) -> Self {
        Self {
            keys: Arc::new(SessionKeys::from_config(cfg)),
            sessions,
            users,
            cookie_secure: cfg.cookie_secure,
        }
    }

    pub async fn start(&self, user: &User, remember: bool) -> anyhow::Result<SessionToken> {
        let ttl = if remember {
            self.keys.remember_ttl
        } else {
            self.keys.ttl
        };
        let purged = self.sessions.purge_expired().await?;
        if purged > 0 {
            debug!(count = purged, "expired sessions purged");
        }
        let session = Session {
            id: Uuid::new_v4(),
            user_id: user.id,
            expires_at: OffsetDateTime::now_utc() + TimeDuration::seconds(ttl.as_secs() as i64),
        };
        self.sessions.insert(&session).await?;
        let value = self.keys.sign(user.id, session.id, session.expires_at)?;
        info!(user_id = %user.id, sid = %session.id, remember, "session started");
        Ok(SessionToken {
            value,
            max_age: remember.then_some(ttl),
        })
    }

    /// Destroys the session behind `token`. Unknown or forged tokens are ignored.
    pub async fn end(&self, token: &str) -> anyhow::Result<()> {
        let Ok(claims) = self.keys.verify(token, false) else {
            debug!("logout with unverifiable token");
            return Ok(());
        };
        self.sessions.delete(claims.sid).await?;
        info!(user_id = %claims.sub, sid = %claims.sid, "session ended");
        Ok(())
    }

    /// Current identity for a request, if its token names a live session.
    pub async fn resolve(&self, headers: &HeaderMap) -> anyhow::Result<Option<User>> {
        let Some(token) = token_from_headers(headers) else {
            return Ok(None);
        };
        let claims = match self.keys.verify(&token, true) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "invalid or expired session token");
                return Ok(None);
            }
        };
        let Some(session) = self.sessions.find(claims.sid).await? else {
            debug!(sid = %claims.sid, "session not found");
            return Ok(None);
        };
        if session.user_id != claims.sub || session.expires_at <= OffsetDateTime::now_utc() {
            debug!(sid = %claims.sid, "stale session row removed");
            self.sessions.delete(claims.sid).await?;
            return Ok(None);
        }
        self.users.find_by_id(session.user_id).await
    }

    /// Ends every session of a user.
    pub async fn revoke_user(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let count = self.sessions.delete_for_user(user_id).await?;
        info!(user_id = %user_id, count, "sessions revoked");
        Ok(count)
    }

    pub fn set_cookie(&self, token: &SessionToken) -> anyhow::Result<HeaderValue> {
        let mut cookie = format!("{}={}; HttpOnly; SameSite=Lax; Path=/", SESSION_COOKIE, token.value);
        if let Some(max_age) = token.max_age {
            cookie.push_str(&format!("; Max-Age={}", max_age.as_secs()));
        }
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).context("session cookie header")
    }

    pub fn clear_cookie(&self) -> anyhow::Result<HeaderValue> {
        let mut cookie = format!("{}=deleted; Max-Age=0; HttpOnly; SameSite=Lax; Path=/", SESSION_COOKIE);
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).context("session cookie header")
    }
}

/// Session token from the `session` cookie, else from a bearer header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    parse_cookie(headers, SESSION_COOKIE).or_else(|| {
        let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        auth.strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .map(str::to_string)
    })
}

fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(s) = value.to_str() else { continue };
        for part in s.split(';') {
            if let Some((k, v)) = part.trim().split_once('=') {
                if k == name && !v.is_empty() {
                    return Some(v.to_string());
                }
            }
        }
    }
    None
}
