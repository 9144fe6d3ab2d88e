pub mod config;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_route;

pub async fn run_server() -> anyhow::Result<()> {
    let config = config::AppConfig::from_env();
    tracing::info!(port = config.port, "configuration loaded");

    let state = state::AppState::new(config.clone()).await?;
    let app = routes::create_route(state);

    let addr = config.listen_address();
    tracing::info!(%addr, "webhook server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
