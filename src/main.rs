use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use rust_web_mindmap::{
    config::Config,
    api::routes::create_router,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;
    let server_addr = config.server_addr;
    info!(
        ai_key_configured = config.openrouter_api_key.is_some(),
        models = ?config.llm.models,
        output_dir = ?config.output_dir,
        "configuration loaded"
    );

    let app_state = AppState::from_config(config)?;
    let app = create_router(app_state);

    let listener = TcpListener::bind(server_addr).await?;
    info!("Listening on {}", server_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
