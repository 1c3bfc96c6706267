use std::time::Duration;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | DATABASE_PATH | data/orders.db | SQLite database file |
/// | HTTP_PORT | 8081 | HTTP listen port |
/// | CACHE_CAPACITY | 1000 | LRU capacity (values below 1 become 1) |
/// | WARMUP_LIMIT | 100 | orders loaded into the cache at startup |
/// | LOOKUP_TIMEOUT_MS | 3000 | store timeout on a cache miss |
/// | COMMIT_INTERVAL_MS | 1000 | stream position commit interval |
/// | INGEST_QUEUE_SIZE | 1024 | pending inbound messages |
/// | DB_CONNECT_TIMEOUT_SECS | 15 | budget for database connect retries |
/// | SHUTDOWN_TIMEOUT_MS | 5000 | HTTP graceful shutdown budget |
/// | LOG_LEVEL | info | filter used when RUST_LOG is unset |
/// | ENVIRONMENT | development | development / staging / production |
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub http_port: u16,
    pub cache_capacity: usize,
    pub warmup_limit: usize,
    pub lookup_timeout_ms: u64,
    pub commit_interval_ms: u64,
    pub ingest_queue_size: usize,
    pub db_connect_timeout_secs: u64,
    pub shutdown_timeout_ms: u64,
    pub log_level: String,
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Missing or unparsable values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<i64>().ok());

        Self {
            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "data/orders.db".into()),
            http_port: lookup("HTTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8081),
            cache_capacity: parsed("CACHE_CAPACITY")
                .map(|n| n.max(1) as usize)
                .unwrap_or(1000),
            warmup_limit: parsed("WARMUP_LIMIT")
                .map(|n| n.max(0) as usize)
                .unwrap_or(100),
            lookup_timeout_ms: lookup("LOOKUP_TIMEOUT_MS")
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            commit_interval_ms: lookup("COMMIT_INTERVAL_MS")
                .and_then(|p| p.parse().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(1000),
            ingest_queue_size: lookup("INGEST_QUEUE_SIZE")
                .and_then(|p| p.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(1024),
            db_connect_timeout_secs: lookup("DB_CONNECT_TIMEOUT_SECS")
                .and_then(|p| p.parse().ok())
                .unwrap_or(15),
            shutdown_timeout_ms: lookup("SHUTDOWN_TIMEOUT_MS")
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".into()),
        }
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn commit_interval(&self) -> Duration {
        Duration::from_millis(self.commit_interval_ms)
    }

    pub fn db_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.db_connect_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
