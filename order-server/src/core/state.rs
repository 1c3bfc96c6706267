use std::sync::Arc;

use crate::cache::OrderCache;
use crate::core::Config;
use crate::db::{DbService, OrderStore};
use crate::ingest::{ChannelSource, IngestPublisher, OffsetTracker, PipelineStats};
use crate::lookup::OrderLookup;

/// Shared server state
///
/// Cheap to clone: every field is a handle. The cache, the pool and the
/// ingestion counters are created once here and injected everywhere else.
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub store: OrderStore,
    pub cache: Arc<OrderCache>,
    pub lookup: OrderLookup,
    pub publisher: IngestPublisher,
    pub pipeline_stats: Arc<PipelineStats>,
    pub offsets: Arc<OffsetTracker>,
}

impl ServerState {
    /// Build the state around an open database
    ///
    /// Returns the consumer half of the ingestion stream alongside; it is
    /// handed to the pipeline by whoever starts the background tasks.
    pub fn new(config: Config, db: DbService) -> (Self, ChannelSource) {
        let store = db.order_store();
        let cache = Arc::new(OrderCache::new(config.cache_capacity));
        let lookup = OrderLookup::new(cache.clone(), store.clone(), config.lookup_timeout());
        let (publisher, source) = ChannelSource::new(config.ingest_queue_size);

        let state = Self {
            store,
            cache,
            lookup,
            publisher,
            pipeline_stats: Arc::new(PipelineStats::default()),
            offsets: source.offsets(),
            db,
            config,
        };
        (state, source)
    }

    /// Open the database from config and build the state
    pub async fn initialize(
        config: Config,
    ) -> Result<(Self, ChannelSource), shared::error::AppError> {
        let db = DbService::new(&config.database_path, config.db_connect_timeout()).await?;
        Ok(Self::new(config, db))
    }
}
