//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use saam_cnd::{
    config::{AppState, Config},
    middleware::cors::cors_layer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração ou o banco falharem, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let app_state = AppState::conectar(&config).await?;
    let cors = cors_layer(&config.cors_allowed_origins)?;

    let app = saam_cnd::app(app_state, cors);

    let listener = TcpListener::bind(&config.server_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
