//! Logging setup.

/// Installs `env_logger` as the global logger.
///
/// Filtering follows `RUST_LOG`. Calling this more than once, or after another
/// logger was installed, has no effect.
pub fn init_logging() {
    if env_logger::try_init().is_ok() {
        log::info!("volumetric-rs logging initialized");
    }
}
