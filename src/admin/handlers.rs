use axum::{
    extract::{Path, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{
    AdminOverview, CreateUserForm, CreateUserRequest, DeleteUserForm, EditUserForm, EditUserRequest, UserList,
};
use crate::{
    auth::{
        dto::PublicUser,
        extractors::CurrentUser,
        password::hash_password,
        repo_types::{is_valid_email, normalize_email, normalize_roles, User, ROLE_USER},
    },
    error::AppError,
    state::AppState,
};

const ADMIN_LANDING: &str = "/admin";
const MIN_PASSWORD_LEN: usize = 8;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_index))
        .route("/admin/users", get(list_users))
        .route("/admin/create_user", get(create_user_form).post(create_user))
        .route("/admin/edit_user/:id", get(edit_user_form).post(edit_user))
        .route("/admin/delete_user/:id", get(delete_user_form).post(delete_user))
}

#[instrument(skip(state, actor))]
pub async fn admin_index(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<Json<AdminOverview>, AppError> {
    let user_count = state.users.list().await?.len();
    Ok(Json(AdminOverview {
        title: "Admin",
        current_user: PublicUser::from(actor),
        user_count,
    }))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UserList>, AppError> {
    let users = state.users.list().await?;
    Ok(Json(UserList {
        title: "Admin Users",
        users: users.into_iter().map(PublicUser::from).collect(),
    }))
}

pub async fn create_user_form() -> Json<CreateUserForm> {
    Json(CreateUserForm {
        title: "Create User",
        roles: vec![ROLE_USER.to_string()],
    })
}

#[instrument(skip(state, actor, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Redirect, AppError> {
    let email = checked_email(&payload.email)?;
    check_password(&payload.password)?;
    let roles = checked_roles(payload.roles.unwrap_or_else(|| vec![ROLE_USER.to_string()]))?;

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::new(email, hash, roles);
    state.users.save(&user).await?;

    info!(actor = %actor.id, user_id = %user.id, email = %user.email, "user created");
    Ok(Redirect::to(ADMIN_LANDING))
}

#[instrument(skip(state))]
pub async fn edit_user_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EditUserForm>, AppError> {
    let user = state.users.find_by_id(id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(EditUserForm {
        title: "Edit User",
        email: user.email,
        roles: user.roles,
    }))
}

#[instrument(skip(state, actor, payload))]
pub async fn edit_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditUserRequest>,
) -> Result<Redirect, AppError> {
    let mut user = state.users.find_by_id(id).await?.ok_or(AppError::NotFound)?;

    if let Some(email) = payload.email {
        let email = checked_email(&email)?;
        if email != user.email {
            if state.users.find_by_email(&email).await?.is_some() {
                warn!(email = %email, "email already registered");
                return Err(AppError::Conflict("Email already registered".into()));
            }
            user.email = email;
        }
    }
    if let Some(roles) = payload.roles {
        user.roles = checked_roles(roles)?;
    }
    let password_changed = match payload.password {
        Some(password) => {
            check_password(&password)?;
            user.password_hash = hash_password(&password)?;
            true
        }
        None => false,
    };

    state.users.save(&user).await?;
    if password_changed {
        state.sessions.revoke_user(user.id).await?;
    }

    info!(actor = %actor.id, user_id = %user.id, password_changed, "user updated");
    Ok(Redirect::to(ADMIN_LANDING))
}

#[instrument(skip(state))]
pub async fn delete_user_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteUserForm>, AppError> {
    let user = state.users.find_by_id(id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(DeleteUserForm {
        title: "Delete User",
        user: PublicUser::from(user),
    }))
}

#[instrument(skip(state, actor))]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Redirect, AppError> {
    let user = state.users.find_by_id(id).await?.ok_or(AppError::NotFound)?;
    state.sessions.revoke_user(user.id).await?;
    state.users.delete(user.id).await?;

    info!(actor = %actor.id, user_id = %user.id, email = %user.email, "user deleted");
    Ok(Redirect::to(ADMIN_LANDING))
}

fn checked_email(raw: &str) -> Result<String, AppError> {
    let email = normalize_email(raw);
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    Ok(email)
}

fn check_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation("Password too short".into()));
    }
    Ok(())
}

fn checked_roles(raw: Vec<String>) -> Result<Vec<String>, AppError> {
    let roles = normalize_roles(raw);
    if roles.is_empty() {
        return Err(AppError::Validation("At least one role is required".into()));
    }
    Ok(roles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app::build_app,
        auth::password::verify_password,
        testing::{seed_user, session_cookie},
    };
    use axum::{
        body::{to_bytes, Body},
        http::{
            header::{self, LOCATION},
            Request, StatusCode,
        },
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn admin_session(state: &AppState) -> (User, String) {
        let admin = seed_user(state, "root@example.org", "pw-root", &["Admin"]).await;
        let cookie = session_cookie(state, &admin).await;
        (admin, cookie)
    }

    fn get(uri: &str, cookie: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap()
    }

    fn post(uri: &str, cookie: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::COOKIE, cookie)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn anonymous_is_redirected_to_login_with_next() {
        let app = build_app(AppState::fake()).unwrap();
        let res = app
            .oneshot(Request::builder().uri("/admin/users").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers().get(LOCATION).unwrap(), "/login?next=%2Fadmin%2Fusers");
    }

    #[tokio::test]
    async fn anonymous_post_is_redirected_before_body_is_read() {
        let app = build_app(AppState::fake()).unwrap();
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/admin/create_user")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn guest_role_is_forbidden_without_detail() {
        let state = AppState::fake();
        let guest = seed_user(&state, "guest@example.org", "pw-guest", &["Guest"]).await;
        let cookie = session_cookie(&state, &guest).await;
        let app = build_app(state).unwrap();

        let (status, body) = json_body(app, get("/admin/users", &cookie)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "error": "forbidden" }));
    }

    #[tokio::test]
    async fn user_role_may_list_users() {
        let state = AppState::fake();
        let member = seed_user(&state, "ada@example.org", "pw-ada", &["User"]).await;
        let cookie = session_cookie(&state, &member).await;
        let app = build_app(state).unwrap();

        let (status, body) = json_body(app, get("/admin/users", &cookie)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["users"][0]["email"], "ada@example.org");
        assert!(body["users"][0].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn admin_index_reports_current_user() {
        let state = AppState::fake();
        let (_, cookie) = admin_session(&state).await;
        let app = build_app(state).unwrap();

        let (status, body) = json_body(app, get("/admin", &cookie)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_user"]["email"], "root@example.org");
        assert_eq!(body["user_count"], 1);
    }

    #[tokio::test]
    async fn create_form_is_served_to_admins() {
        let state = AppState::fake();
        let (_, cookie) = admin_session(&state).await;
        let app = build_app(state).unwrap();

        let (status, body) = json_body(app, get("/admin/create_user", &cookie)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Create User");
        assert_eq!(body["roles"], json!(["User"]));
    }

    #[tokio::test]
    async fn create_user_hashes_password() {
        let state = AppState::fake();
        let (_, cookie) = admin_session(&state).await;
        let app = build_app(state.clone()).unwrap();

        let res = app
            .oneshot(post(
                "/admin/create_user",
                &cookie,
                json!({ "email": "New@Example.org", "password": "volunteer1" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers().get(LOCATION).unwrap(), ADMIN_LANDING);

        let created = state.users.find_by_email("new@example.org").await.unwrap().unwrap();
        assert_eq!(created.roles, vec![ROLE_USER.to_string()]);
        assert_ne!(created.password_hash, "volunteer1");
        assert!(verify_password("volunteer1", &created.password_hash).unwrap());
    }

    #[tokio::test]
    async fn create_user_rejects_duplicate_email() {
        let state = AppState::fake();
        let (_, cookie) = admin_session(&state).await;
        let app = build_app(state).unwrap();

        let (status, _) = json_body(
            app,
            post(
                "/admin/create_user",
                &cookie,
                json!({ "email": "ROOT@example.org", "password": "volunteer1" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn create_user_validates_input() {
        let state = AppState::fake();
        let (_, cookie) = admin_session(&state).await;
        let app = build_app(state).unwrap();

        let (status, _) = json_body(
            app.clone(),
            post("/admin/create_user", &cookie, json!({ "email": "nope", "password": "volunteer1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = json_body(
            app.clone(),
            post("/admin/create_user", &cookie, json!({ "email": "a@b.io", "password": "short" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = json_body(
            app,
            post(
                "/admin/create_user",
                &cookie,
                json!({ "email": "a@b.io", "password": "volunteer1", "roles": [" "] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn edit_form_shows_current_values() {
        let state = AppState::fake();
        let (_, cookie) = admin_session(&state).await;
        let target = seed_user(&state, "ada@example.org", "pw-ada", &["User"]).await;
        let app = build_app(state).unwrap();

        let (status, body) =
            json_body(app, get(&format!("/admin/edit_user/{}", target.id), &cookie)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ada@example.org");
        assert_eq!(body["roles"], json!(["User"]));
    }

    #[tokio::test]
    async fn edit_user_updates_and_revokes_sessions_on_password_change() {
        let state = AppState::fake();
        let (_, cookie) = admin_session(&state).await;
        let target = seed_user(&state, "ada@example.org", "pw-ada", &["User"]).await;
        let target_cookie = session_cookie(&state, &target).await;
        let app = build_app(state.clone()).unwrap();

        let res = app
            .clone()
            .oneshot(post(
                &format!("/admin/edit_user/{}", target.id),
                &cookie,
                json!({ "email": "ada.l@example.org", "password": "new-password", "roles": ["Admin"] }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);

        let updated = state.users.find_by_id(target.id).await.unwrap().unwrap();
        assert_eq!(updated.email, "ada.l@example.org");
        assert_eq!(updated.roles, vec!["Admin".to_string()]);
        assert!(verify_password("new-password", &updated.password_hash).unwrap());

        let res = app.oneshot(get("/me", &target_cookie)).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn edit_unknown_user_is_not_found() {
        let state = AppState::fake();
        let (_, cookie) = admin_session(&state).await;
        let app = build_app(state).unwrap();

        let (status, _) = json_body(
            app,
            post(&format!("/admin/edit_user/{}", Uuid::new_v4()), &cookie, json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_user_removes_user_and_sessions() {
        let state = AppState::fake();
        let (_, cookie) = admin_session(&state).await;
        let target = seed_user(&state, "ada@example.org", "pw-ada", &["User"]).await;
        let target_cookie = session_cookie(&state, &target).await;
        let app = build_app(state.clone()).unwrap();

        let (status, body) =
            json_body(app.clone(), get(&format!("/admin/delete_user/{}", target.id), &cookie)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "ada@example.org");

        let res = app
            .clone()
            .oneshot(post(&format!("/admin/delete_user/{}", target.id), &cookie, json!({})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert!(state.users.find_by_id(target.id).await.unwrap().is_none());
        assert_eq!(state.sessions.revoke_user(target.id).await.unwrap(), 0);

        let res = app.oneshot(get("/admin/users", &target_cookie)).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
    }
}
