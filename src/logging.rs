use env_logger::Env;
use log::LevelFilter;

/// Initialize the global logger. `RUST_LOG` wins over `default_level` when set.
///
/// Without `RUST_LOG` the logger accepts every level and the cap is set with
/// [`set_level`], so settings loaded later can still adjust it.
pub fn init_logging(default_level: &str) {
    let from_env = std::env::var_os("RUST_LOG").is_some();
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("trace"))
        .format_timestamp_millis()
        .try_init();
    if !from_env {
        set_level(default_level);
    }
}

/// Change the level cap unless `RUST_LOG` is in charge. Unknown names are ignored.
pub fn set_level(level: &str) {
    if std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    match level.parse::<LevelFilter>() {
        Ok(filter) => log::set_max_level(filter),
        Err(_) => log::warn!("Unknown log level '{}', keeping {}", level, log::max_level()),
    }
}
