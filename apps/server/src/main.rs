use allocation_server::api::app_router;
use allocation_server::config::Config;
use allocation_server::main_lib::{build_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(&config);
    let state = build_state(&config)?;
    let router = app_router(state, &config);

    let listen_addr = format!("0.0.0.0:{}", config.server_port);
    tracing::info!("Listening on {}", listen_addr);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
