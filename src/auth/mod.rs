use crate::state::AppState;
use axum::Router;

pub mod authz;
pub mod dto;
pub mod extractors;
pub mod guard;
pub mod handlers;
pub mod password;
pub mod redirect;
pub mod repo;
pub mod repo_types;
pub mod session;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
