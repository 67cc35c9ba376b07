//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Builds the log filter for `config`, falling back to `info` when the
/// configured directive does not parse.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global fmt subscriber.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case the existing one is left in place.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let filter = env_filter(config);

    let installed = if config.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_level_falls_back_to_info() {
        let config = LoggingConfig {
            level: "credstore=loudest".to_string(),
            json: false,
        };
        assert_eq!(
            env_filter(&config).max_level_hint(),
            Some(tracing_subscriber::filter::LevelFilter::INFO)
        );
    }

    #[test]
    fn second_init_is_harmless() {
        let config = LoggingConfig::default();
        init_tracing(&config);
        assert!(!init_tracing(&config), "a subscriber is already installed");
    }
}
