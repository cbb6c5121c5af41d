use tracing_subscriber::EnvFilter;

/// Initialise logging. `RUST_LOG` is only honoured when debug logging is
/// enabled; otherwise the level is pinned to `info`.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// `PICKSHOT_DEBUG` set to `1` or `true` turns on debug logging
pub fn debug_from_env() -> bool {
    std::env::var("PICKSHOT_DEBUG")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
