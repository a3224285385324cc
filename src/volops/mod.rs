use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;

use crate::{
    auth::{
        authz::{ConfigError, RequiredRoles},
        dto::PublicUser,
        extractors::CurrentUser,
        guard::{require_roles, RoleGuard},
        repo_types::{ROLE_ADMIN, ROLE_USER},
    },
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct VolopsOverview {
    pub title: &'static str,
    pub current_user: PublicUser,
}

/// Volunteer operations area, open to the same roles as the admin screens.
pub fn router(state: AppState) -> Result<Router<AppState>, ConfigError> {
    let required = RequiredRoles::new([ROLE_ADMIN, ROLE_USER])?;
    Ok(Router::new()
        .route("/volops", get(volops_index))
        .route_layer(from_fn_with_state(RoleGuard::new(state, required), require_roles)))
}

#[instrument(skip(user))]
pub async fn volops_index(CurrentUser(user): CurrentUser) -> Json<VolopsOverview> {
    Json(VolopsOverview {
        title: "Volunteer Operations",
        current_user: PublicUser::from(user),
    })
}
