/// Initialize logging.
///
/// `RUST_LOG` is applied on top of the default filters.
pub fn init_logger() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        // We keep wgpu at Warn level, as it's very noisy.
        .filter_module("wgpu_core", log::LevelFilter::Warn)
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .filter_module("naga", log::LevelFilter::Error)
        .filter_module("calloop", log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
