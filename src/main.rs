mod api;
mod config;
mod db;
mod error;
mod flow;
mod state;
mod uploads;
mod util;

use config::Config;
use state::AppState;
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "billpos=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let state = AppState::new(&config).await?;
    let router = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port)).await?;
    tracing::info!("Server running on port {}", config.http_port);
    axum::serve(listener, router).await?;

    Ok(())
}
