use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

use crate::{
    auth::{
        password::hash_password,
        repo::UserStore,
        repo_types::{is_valid_email, normalize_email, User, ROLE_ADMIN},
    },
    config::AppConfig,
};

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("connect to database")
}

pub async fn migrate(db: &PgPool) {
    if let Err(e) = sqlx::migrate!("./migrations").run(db).await {
        warn!(error = %e, "migrations failed; continuing");
    }
}

/// Creates the bootstrap administrator unless that email is already taken.
pub async fn seed_admin(users: &dyn UserStore, config: &AppConfig) -> anyhow::Result<()> {
    let Some(seed) = &config.admin_seed else {
        return Ok(());
    };
    let email = normalize_email(&seed.email);
    if !is_valid_email(&email) {
        anyhow::bail!("ADMIN_EMAIL is not a valid email");
    }
    if users.find_by_email(&email).await?.is_some() {
        return Ok(());
    }
    let hash = hash_password(&seed.password).context("hash ADMIN_PASSWORD")?;
    let user = User::new(email, hash, vec![ROLE_ADMIN.to_string()]);
    users.save(&user).await?;
    info!(user_id = %user.id, email = %user.email, "bootstrap admin created");
    Ok(())
}
