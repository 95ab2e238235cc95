use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global tracing subscriber for the hosting application.
///
/// Honours `RUST_LOG`, defaulting to `info` when it is unset or invalid.
/// Fails if a global subscriber is already installed.
pub fn init() -> anyhow::Result<()> {
    let filter = env_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    Ok(())
}

fn env_filter(directives: Option<String>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
