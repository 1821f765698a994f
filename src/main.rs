use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use ragadata_chat::{
    config::Config,
    credentials::EnvCredentialSource,
    llm::InferenceAdapter,
    routes::create_router,
    utils::logger::init_logger,
    AppState,
};

/// Data exploration server with LLM question answering
#[derive(Debug, Parser)]
#[command(name = "ragadata-chat", version)]
struct Args {
    /// Address to bind, overrides HOST
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overrides PORT
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let _log_guard = init_logger(config.logging.log_dir.as_deref());
    info!("Configuration loaded: {:?}", config.server);

    // The credential must be present before anything is served
    let adapter = InferenceAdapter::from_source(&config.llm, &EnvCredentialSource::default())
        .map_err(|e| anyhow::anyhow!("Failed to build LLM client: {}", e))?;
    info!(endpoint = %config.llm.endpoint, model = %config.llm.model, "LLM adapter ready");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, Arc::new(adapter));
    let app = create_router(state);

    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
