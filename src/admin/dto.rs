use serde::{Deserialize, Serialize};

use crate::auth::dto::PublicUser;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    /// Defaults to `["User"]`.
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

/// Defaults for an empty create form.
#[derive(Debug, Serialize)]
pub struct CreateUserForm {
    pub title: &'static str,
    pub roles: Vec<String>,
}

/// Omitted fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct EditUserRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

/// Current values to prefill the edit form.
#[derive(Debug, Serialize)]
pub struct EditUserForm {
    pub title: &'static str,
    pub email: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteUserForm {
    pub title: &'static str,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct AdminOverview {
    pub title: &'static str,
    pub current_user: PublicUser,
    pub user_count: usize,
}

#[derive(Debug, Serialize)]
pub struct UserList {
    pub title: &'static str,
    pub users: Vec<PublicUser>,
}
