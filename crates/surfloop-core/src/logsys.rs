//! `env_logger` setup for hosts that do not install their own logger.

use env_logger::Env;

/// Install `env_logger`, honouring `RUST_LOG` and defaulting to `info`.
///
/// Returns `false` if a logger was already installed.
pub fn init() -> bool {
    init_with_filter("info")
}

pub fn init_with_filter(default_filter: &str) -> bool {
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .is_test(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_existing_logger() {
        let _ = init();
        assert!(!init_with_filter("debug"));
        log::info!(target: "surface", "logsys.test");
    }
}
