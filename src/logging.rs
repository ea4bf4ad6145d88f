use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "study_planner=info";

/// Install the stderr subscriber used by both binaries. `RUST_LOG` wins
/// over the default filter. Calling this twice is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
