use std::path::PathBuf;

use anyhow::{Context, Result};

/// Default generator model, routed through OpenRouter.
pub const DEFAULT_MODEL: &str = "anthropic/claude-haiku-4.5";
const DEFAULT_CACHE_DIR: &str = ".rubric_cache";

/// Matcher configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub openrouter_api_key: String,
    pub model: String,
    pub rubric_cache_dir: PathBuf,
    pub rubric_cache_enabled: bool,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openrouter_api_key: require_env("OPENROUTER_API_KEY")?,
            model: std::env::var("MATCHER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            rubric_cache_dir: std::env::var("RUBRIC_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_DIR)),
            rubric_cache_enabled: match std::env::var("RUBRIC_CACHE_ENABLED") {
                Ok(raw) => parse_flag(&raw)
                    .with_context(|| format!("RUBRIC_CACHE_ENABLED must be a boolean, got '{raw}'"))?,
                Err(_) => true,
            },
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("unrecognised flag value '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    const VARS: [&str; 5] = [
        "OPENROUTER_API_KEY",
        "MATCHER_MODEL",
        "RUBRIC_CACHE_DIR",
        "RUBRIC_CACHE_ENABLED",
        "RUST_LOG",
    ];

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serializes environment access and restores the previous values on drop.
    struct EnvGuard {
        _lock: MutexGuard<'static, ()>,
        saved: Vec<(&'static str, Option<String>)>,
    }

    impl EnvGuard {
        /// Clears every config variable, then sets `vars`.
        fn set(vars: &[(&str, &str)]) -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            let saved = VARS.iter().map(|k| (*k, std::env::var(k).ok())).collect();
            for key in VARS {
                std::env::remove_var(key);
            }
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in &self.saved {
                match value {
                    Some(v) => std::env::set_var(key, v),
                    None => std::env::remove_var(key),
                }
            }
        }
    }

    #[test]
    fn test_missing_api_key_fails() {
        let _env = EnvGuard::set(&[]);
        let err = Config::from_env().unwrap_err();
        assert!(format!("{err:#}").contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn test_defaults_apply_when_unset() {
        let _env = EnvGuard::set(&[("OPENROUTER_API_KEY", "sk-or-test")]);
        let config = Config::from_env().unwrap();
        assert_eq!(config.openrouter_api_key, "sk-or-test");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.rubric_cache_dir, PathBuf::from(".rubric_cache"));
        assert!(config.rubric_cache_enabled);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_overrides_are_read() {
        let _env = EnvGuard::set(&[
            ("OPENROUTER_API_KEY", "sk-or-test"),
            ("MATCHER_MODEL", "openai/gpt-4o-mini"),
            ("RUBRIC_CACHE_DIR", "/tmp/rubrics"),
            ("RUBRIC_CACHE_ENABLED", "0"),
            ("RUST_LOG", "debug"),
        ]);
        let config = Config::from_env().unwrap();
        assert_eq!(config.model, "openai/gpt-4o-mini");
        assert_eq!(config.rubric_cache_dir, PathBuf::from("/tmp/rubrics"));
        assert!(!config.rubric_cache_enabled);
        assert_eq!(config.rust_log, "debug");
    }

    #[test]
    fn test_invalid_cache_flag_fails() {
        let _env = EnvGuard::set(&[
            ("OPENROUTER_API_KEY", "sk-or-test"),
            ("RUBRIC_CACHE_ENABLED", "sometimes"),
        ]);
        let err = Config::from_env().unwrap_err();
        assert!(format!("{err:#}").contains("RUBRIC_CACHE_ENABLED"));
    }

    #[test]
    fn test_parse_flag_accepts_common_spellings() {
        assert!(parse_flag("true").unwrap());
        assert!(parse_flag(" YES ").unwrap());
        assert!(parse_flag("1").unwrap());
        assert!(!parse_flag("false").unwrap());
        assert!(!parse_flag("off").unwrap());
    }

    #[test]
    fn test_parse_flag_rejects_garbage() {
        assert!(parse_flag("maybe").is_err());
    }
}
