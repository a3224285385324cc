use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::authz::Identity;

pub const ROLE_ADMIN: &str = "Admin";
pub const ROLE_USER: &str = "User";

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string
    pub roles: Vec<String>,
    pub created_at: OffsetDateTime,
}

impl User {
    /// New, not yet persisted user. `password_hash` must come from
    /// [`super::password::hash_password`].
    pub fn new(email: String, password_hash: String, roles: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            roles,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

impl Identity for User {
    fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Server-side half of a login session.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expires_at: OffsetDateTime,
}

/// Emails are stored and looked up trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trims, drops blanks and duplicates, keeps first-seen order.
pub fn normalize_roles<I, S>(roles: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for role in roles {
        let role = role.as_ref().trim();
        if !role.is_empty() && !out.iter().any(|r| r == role) {
            out.push(role.to_string());
        }
    }
    out
}
