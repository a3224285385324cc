use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::{
    auth::{
        authz::{authorize, Decision, DenyReason, RequiredRoles},
        extractors::{original_target, CurrentUser},
    },
    error::AppError,
    state::AppState,
};

/// State for [`require_roles`]: the app plus the roles one route group needs.
#[derive(Clone)]
pub struct RoleGuard {
    pub state: AppState,
    pub required: Arc<RequiredRoles>,
}

impl RoleGuard {
    pub fn new(state: AppState, required: RequiredRoles) -> Self {
        Self {
            state,
            required: Arc::new(required),
        }
    }
}

/// Route layer: resolve the session, then check roles.
pub async fn require_roles(
    State(guard): State<RoleGuard>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = match guard.state.sessions.resolve(req.headers()).await {
        Ok(identity) => identity,
        Err(e) => return AppError::Internal(e).into_response(),
    };
    match authorize(identity.as_ref(), &guard.required) {
        Decision::Authorized => {
            if let Some(user) = identity {
                req.extensions_mut().insert(CurrentUser(user));
            }
            next.run(req).await
        }
        Decision::Forbidden(DenyReason::NotAuthenticated) => AppError::NotAuthenticated {
            next: original_target(req.uri().path(), req.uri().query()),
        }
        .into_response(),
        Decision::Forbidden(DenyReason::InsufficientRole) => {
            if let Some(user) = &identity {
                warn!(user_id = %user.id, path = %req.uri().path(), "access denied");
            }
            AppError::InsufficientRole.into_response()
        }
    }
}
