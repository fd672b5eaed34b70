//! Tracing initialization for binaries embedding this service layer.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber. `RUST_LOG` wins when set; otherwise
/// shredbox crates log at debug.
pub fn init_telemetry() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "shredbox=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    Ok(())
}
