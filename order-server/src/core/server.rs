//! Server Implementation
//!
//! Startup order: warm-up, background tasks, HTTP. Shutdown runs in reverse.

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;

use crate::api;
use crate::core::{BackgroundTasks, Result, ServerState, TaskKind};
use crate::ingest::{ChannelSource, IngestPipeline};
use crate::warmup::warm_up_cache;

/// HTTP server plus its ingestion workers
pub struct Server {
    state: ServerState,
    source: ChannelSource,
}

impl Server {
    pub fn new(state: ServerState, source: ChannelSource) -> Self {
        Self { state, source }
    }

    /// Run until `shutdown` resolves, then stop HTTP, workers and the pool
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Server { state, source } = self;
        let config = state.config.clone();

        // Warm-up finishes before anything is served
        warm_up_cache(&state.store, &state.cache, config.warmup_limit).await;

        let tasks = Self::start_background_tasks(&state, source);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, environment = %config.environment, "Order server listening");

        let http_stop = CancellationToken::new();
        let app = api::build_app(state.clone());
        let mut http = tokio::spawn(
            axum::serve(listener, app)
                .with_graceful_shutdown(http_stop.clone().cancelled_owned())
                .into_future(),
        );

        let http_result = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                http_stop.cancel();
                match tokio::time::timeout(config.shutdown_timeout(), &mut http).await {
                    Ok(result) => Some(result),
                    Err(_) => {
                        tracing::warn!(
                            timeout_ms = config.shutdown_timeout_ms,
                            "HTTP graceful shutdown timed out, aborting open connections"
                        );
                        http.abort();
                        None
                    }
                }
            }
            result = &mut http => {
                tracing::error!("HTTP server exited before shutdown");
                Some(result)
            }
        };

        tasks.shutdown(config.shutdown_timeout()).await;
        state.db.close().await;
        tracing::info!("Order server stopped");

        if let Some(result) = http_result {
            result??;
        }
        Ok(())
    }

    /// Spawn the ingestion pipeline and its offset commit ticker
    pub fn start_background_tasks(state: &ServerState, source: ChannelSource) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let ticker = source.commit_ticker(state.config.commit_interval());
        tasks.spawn(
            "offset_commit",
            TaskKind::Periodic,
            ticker.run(tasks.shutdown_token()),
        );

        let mut pipeline = IngestPipeline::new(
            source,
            state.store.clone(),
            state.cache.clone(),
            state.pipeline_stats.clone(),
        );
        let token = tasks.shutdown_token();
        tasks.spawn("ingest_pipeline", TaskKind::Worker, async move {
            if let Err(e) = pipeline.run(token).await {
                tracing::error!(error = %e, "Ingestion pipeline stopped");
            }
            if let Err(e) = pipeline.close().await {
                tracing::warn!(error = %e, "Failed to close ingestion stream");
            }
        });

        tasks.log_summary();
        tasks
    }
}
