use std::sync::Arc;

mod app;
mod auth;
mod config;
mod db;
mod error;
mod memory;
mod movies;
mod response;
mod state;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "movieshelf=debug,axum=info,tower_http=info".to_string());
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

    let config = Arc::new(AppConfig::from_env()?);

    let state = match config.database_url.as_deref() {
        Some(url) => {
            let pool = db::connect(url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("connected to postgres, migrations applied");
            AppState::with_postgres(config.clone(), pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store, data is lost on exit");
            AppState::in_memory(config.clone())
        }
    };

    let app = app::build_app(state);
    app::serve(app, &config).await
}
