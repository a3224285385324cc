mod admin;
mod app;
mod auth;
mod config;
mod db;
mod error;
mod state;
#[cfg(test)]
mod testing;
mod volops;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "volunteermatching=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let pool = db::connect(&config).await?;
    db::migrate(&pool).await;

    let app_state = AppState::from_pool(pool, &config);
    db::seed_admin(app_state.users.as_ref(), &config).await?;

    let app = app::build_app(app_state)?;
    app::serve(app).await
}
