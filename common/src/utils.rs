// common/src/utils.rs
use chrono::{DateTime, Utc};
use tracing_subscriber::{fmt, EnvFilter};

/// Setup tracing for consistent logging across the service.
///
/// Defaults to INFO; `RUST_LOG` overrides it (e.g. `RUST_LOG=server=debug`).
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt().with_env_filter(filter).with_target(true).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("tracing subscriber already installed: {}", e);
    }
}

/// Current unix time in whole seconds.
pub fn now_secs() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

pub fn timestamp_to_datetime(secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or_default()
}
