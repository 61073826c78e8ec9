//! Logger setup for binaries. Library code only uses the `log` macros.

/// Initialise env_logger. `RUST_LOG` wins over `default_level`.
/// Calling it again after a logger is installed is a no-op.
pub fn init_logging(default_level: &str) {
    let result = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .try_init();
    if result.is_err() {
        log::debug!("Logger already initialised");
    }
}
