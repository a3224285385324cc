use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};

use crate::{auth::repo_types::User, error::AppError, state::AppState};

/// Identity that passed the route's role guard.
///
/// Only available behind [`super::guard::require_roles`], which places it
/// in the request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("route is missing its role guard")))
    }
}

/// Identity of the caller, or `None` for anonymous requests.
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = state.sessions.resolve(&parts.headers).await?;
        Ok(MaybeUser(user))
    }
}

/// Any authenticated caller; anonymous ones are sent to the login page.
pub struct LoggedIn(pub User);

#[async_trait]
impl FromRequestParts<AppState> for LoggedIn {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match state.sessions.resolve(&parts.headers).await? {
            Some(user) => Ok(LoggedIn(user)),
            None => Err(AppError::NotAuthenticated {
                next: original_target(parts.uri.path(), parts.uri.query()),
            }),
        }
    }
}

/// Path plus query string, as the caller asked for it.
pub fn original_target(path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("{}?{}", path, q),
        _ => path.to_string(),
    }
}
