use tracing_subscriber::EnvFilter;

/// Directives used when neither `RUST_LOG` nor an explicit filter is given.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

pub fn init() {
    init_with_filter(DEFAULT_FILTER);
}

/// Install the global fmt subscriber. `RUST_LOG` takes precedence over `directives`.
///
/// Calling this more than once is harmless; only the first call installs a subscriber.
pub fn init_with_filter(directives: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
