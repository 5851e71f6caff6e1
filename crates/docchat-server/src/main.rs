use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use docchat_server::config::Config;
use docchat_server::state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Misconfiguration is the only fatal case; it happens here,
    // before the socket is bound.
    let config = Config::from_env()?;
    let port = config.port;

    tracing::info!(
        backend = config.backend.as_str(),
        streaming = config.stream_responses,
        memory = config.memory_enabled,
        "starting docchat"
    );

    let state = AppState::new(config)?;
    let app = docchat_server::router(state);

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
