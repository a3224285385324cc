mod dto;
pub mod handlers;

use crate::{
    auth::{
        authz::{ConfigError, RequiredRoles},
        guard::{require_roles, RoleGuard},
        repo_types::{ROLE_ADMIN, ROLE_USER},
    },
    state::AppState,
};
use axum::{middleware::from_fn_with_state, Router};

/// Admin screens; every route requires `Admin` or `User`.
pub fn router(state: AppState) -> Result<Router<AppState>, ConfigError> {
    let required = RequiredRoles::new([ROLE_ADMIN, ROLE_USER])?;
    Ok(handlers::admin_routes()
        .route_layer(from_fn_with_state(RoleGuard::new(state, required), require_roles)))
}
