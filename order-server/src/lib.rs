//! Order ingest-and-serve server
//!
//! Orders arrive on an ingestion stream, are persisted transactionally to
//! SQLite and cached in a bounded LRU. Lookups go cache first and fall back
//! to the store.

pub mod api;
pub mod cache;
pub mod core;
pub mod db;
pub mod ingest;
pub mod lookup;
pub mod utils;
pub mod warmup;

pub use cache::{LruCache, OrderCache};
pub use crate::core::{Config, Server, ServerState};
pub use db::{DbService, OrderStore, StoreError};
pub use ingest::{ChannelSource, IngestOutcome, IngestPipeline, MessageSource};
pub use lookup::{LookupError, OrderLookup};
pub use warmup::{WarmupReport, warm_up_cache};
