use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use lazy_static::lazy_static;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginPage, LoginRequest, NextQuery, PublicUser},
        extractors::{LoggedIn, MaybeUser},
        password::{hash_password, verify_password},
        redirect::{safe_next, DEFAULT_LANDING},
        repo_types::{is_valid_email, normalize_email},
        session::token_from_headers,
    },
    error::AppError,
    state::AppState,
};

lazy_static! {
    /// Verified against when the email is unknown, so both login failures
    /// cost one Argon2 verification.
    static ref DUMMY_HASH: String = hash_password("not-a-real-password").unwrap_or_default();
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout).post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(current))]
pub async fn login_page(
    MaybeUser(current): MaybeUser,
    Query(q): Query<NextQuery>,
) -> Response {
    if current.is_some() {
        return Redirect::to(DEFAULT_LANDING).into_response();
    }
    Json(LoginPage {
        title: "Sign In",
        next: safe_next(q.next.as_deref()),
    })
    .into_response()
}

#[instrument(skip(state, current, payload))]
pub async fn login(
    State(state): State<AppState>,
    MaybeUser(current): MaybeUser,
    Query(q): Query<NextQuery>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, AppError> {
    if current.is_some() {
        return Ok(Redirect::to(DEFAULT_LANDING).into_response());
    }

    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }

    let user = state.users.find_by_email(&email).await?;
    let ok = match &user {
        Some(u) => verify_password(&payload.password, &u.password_hash)?,
        None => {
            let _ = verify_password(&payload.password, &DUMMY_HASH);
            false
        }
    };
    let user = match user {
        Some(u) if ok => u,
        Some(u) => {
            warn!(email = %email, user_id = %u.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }
        None => {
            warn!(email = %email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    let token = state.sessions.start(&user, payload.remember_me).await?;
    let cookie = state.sessions.set_cookie(&token)?;
    let target = safe_next(q.next.as_deref());

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(&target)).into_response())
}

#[instrument(skip(state, headers))]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(token) = token_from_headers(&headers) {
        state.sessions.end(&token).await?;
    }
    let cookie = state.sessions.clear_cookie()?;
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(DEFAULT_LANDING)).into_response())
}

#[instrument(skip(user))]
pub async fn get_me(LoggedIn(user): LoggedIn) -> Json<PublicUser> {
    Json(PublicUser::from(user))
}
