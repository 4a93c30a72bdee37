use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Installs the global structured-logging subscriber.
///
/// `RUST_LOG` wins when set; otherwise the crate logs at `config.rust_log`.
/// Returns `false` if a subscriber was already installed (e.g. by the host application).
pub fn init_tracing(config: &Config) -> bool {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_second_init_is_not_an_error() {
        let config = Config {
            openrouter_api_key: "sk-or-test".to_string(),
            model: crate::config::DEFAULT_MODEL.to_string(),
            rubric_cache_dir: PathBuf::from(".rubric_cache"),
            rubric_cache_enabled: false,
            rust_log: "debug".to_string(),
        };
        init_tracing(&config);
        assert!(!init_tracing(&config));
    }
}
