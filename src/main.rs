use axum::{routing::get, Router};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use anyhow::Result;

use periods_backend::{config::Config, routes, store};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    if config.run_migrations {
        store::postgres::run_migrations(&pool).await?;
        tracing::info!("📦 Migrations applied");
    }

    let app = Router::new()
        .merge(routes::users::routes(pool.clone()))
        .merge(routes::periods::routes(pool.clone()))
        .merge(routes::statistics::routes(pool.clone()))
        .route("/health", get(|| async { "✅ Backend up" }));

    tracing::info!("🧠 Server running at {}", config.bind_addr);

    axum::serve(
        tokio::net::TcpListener::bind(config.bind_addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}
