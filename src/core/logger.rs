/// Logs at `Info` unless `RUST_LOG` says otherwise.
pub fn setup_logging() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_millis()
        .init();
}
