use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "DBM_FLOW_LOG";
const DEFAULT_FILTER: &str = "info";

/// Install the process-wide fmt subscriber.
///
/// `DBM_FLOW_LOG` wins over the configured filter. Calling this twice is a
/// no-op.
pub fn init(configured: Option<&str>, debug: bool) {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| debug.then(|| "debug".to_string()))
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_FILTER.to_string());
    let env_filter =
        EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
