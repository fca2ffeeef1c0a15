use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "loopdev_lib=debug,warn";

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize logging with tracing
///
/// This function sets up the tracing subscriber with the following configuration:
/// - Reads filter from RUST_LOG environment variable if available
/// - Falls back to "loopdev_lib=debug,warn" if RUST_LOG is not set
/// - Uses a formatted output layer
///
/// Panics if a global subscriber is already installed; hosts that install
/// their own should call [`try_init_logging`] instead.
///
/// # Example
///
/// ```no_run
/// use loopdev_lib::utils::logging::init_logging;
///
/// init_logging();
/// ```
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(default_filter())
        .init();

    tracing::info!("loopdev logging initialized");
}

/// Like [`init_logging`], but returns `false` when a subscriber is already set
pub fn try_init_logging() -> bool {
    let installed = tracing_subscriber::registry()
        .with(fmt::layer())
        .with(default_filter())
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("loopdev logging initialized");
    }
    installed
}
