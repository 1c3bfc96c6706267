use order_server::utils::init_logger;
use order_server::{Config, Server, ServerState};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let _ = dotenvy::dotenv();

    let config = Config::from_env();
    init_logger(&config.log_level, config.is_production());

    tracing::info!(
        environment = %config.environment,
        database = %config.database_path,
        cache_capacity = config.cache_capacity,
        "Starting order-server"
    );

    let (state, source) = ServerState::initialize(config).await?;
    Server::new(state, source).run(shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
