//! Logging Infrastructure
//!
//! `RUST_LOG` wins when set; otherwise `default_level` applies to this crate
//! and to HTTP tracing. Production output is JSON lines.

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber (call once, from the binary)
pub fn init_logger(default_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "order_server={default_level},shared={default_level},tower_http={default_level},sqlx=warn"
        ))
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
