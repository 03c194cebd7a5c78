//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.
//!
//! Only the grading runner reads this singleton. Library code receives its
//! settings explicitly (see `integrity::evaluator::EvaluationSettings` and the
//! `source_check` lookup settings), so tests can build them without touching
//! process-wide state.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};

/// Default plagiarism threshold, as a percentage.
pub const DEFAULT_PLAGIARISM_THRESHOLD: f64 = 40.0;

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    /// Mirror log output to stderr. Stdout is reserved for the JSON report.
    pub log_to_stderr: bool,
    pub plagiarism_threshold: f64,
    pub lookup_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub source_max_results: usize,
    pub source_min_similarity: f64,
    pub serpapi_api_key: String,
    pub web_search_fallback: bool,
    pub academic_search_url: String,
    pub academic_search_api_key: String,
    pub academic_collection: String,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

/// Reads `key` and parses it, falling back to `default` when unset or malformed.
fn parsed_var<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Like [`parsed_var`], but zero also counts as malformed.
fn positive_var(key: &str, default: u64) -> u64 {
    match parsed_var(key, default) {
        0 => default,
        value => value,
    }
}

fn bool_var(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        Err(_) => default,
    }
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Every key has a default; numeric keys that fail to parse keep their default.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "integrity-grader".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "grader=info,integrity=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "grader.log".into()),
            log_to_stderr: bool_var("LOG_TO_STDERR", false),
            plagiarism_threshold: parsed_var("PLAGIARISM_THRESHOLD", DEFAULT_PLAGIARISM_THRESHOLD),
            lookup_timeout_secs: positive_var("LOOKUP_TIMEOUT_SECS", 30),
            download_timeout_secs: positive_var("DOWNLOAD_TIMEOUT_SECS", 30),
            source_max_results: parsed_var("SOURCE_MAX_RESULTS", 5),
            source_min_similarity: parsed_var("SOURCE_MIN_SIMILARITY", 0.1),
            serpapi_api_key: env::var("SERPAPI_API_KEY").unwrap_or_default(),
            web_search_fallback: bool_var("WEB_SEARCH_FALLBACK", true),
            academic_search_url: env::var("ACADEMIC_SEARCH_URL").unwrap_or_default(),
            academic_search_api_key: env::var("ACADEMIC_SEARCH_API_KEY").unwrap_or_default(),
            academic_collection: env::var("ACADEMIC_COLLECTION")
                .unwrap_or_else(|_| "teachmate".into()),
        }
    }

    /// Returns a snapshot of the global configuration.
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    pub fn global() -> AppConfig {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
            .clone()
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            if let Ok(mut guard) = lock.write() {
                *guard = AppConfig::from_env();
            }
        }
    }

    /// Generic internal setter for any field in the config.
    ///
    /// Used by public per-field setter methods.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    /// `true` when a SerpAPI key is present.
    pub fn serpapi_enabled(&self) -> bool {
        !self.serpapi_api_key.trim().is_empty()
    }

    /// `true` when an academic search endpoint is present.
    pub fn academic_search_enabled(&self) -> bool {
        !self.academic_search_url.trim().is_empty()
    }

    // --- Per-field setters below ---

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_log_file(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_file = value.into());
    }

    pub fn set_log_to_stderr(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stderr = value);
    }

    /// Override the plagiarism threshold (percentage).
    pub fn set_plagiarism_threshold(value: f64) {
        AppConfig::set_field(|cfg| cfg.plagiarism_threshold = value);
    }

    pub fn set_lookup_timeout_secs(value: u64) {
        AppConfig::set_field(|cfg| cfg.lookup_timeout_secs = value);
    }

    pub fn set_serpapi_api_key(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.serpapi_api_key = value.into());
    }

    pub fn set_web_search_fallback(value: bool) {
        AppConfig::set_field(|cfg| cfg.web_search_fallback = value);
    }

    pub fn set_academic_search_url(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.academic_search_url = value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "PLAGIARISM_THRESHOLD",
        "LOOKUP_TIMEOUT_SECS",
        "DOWNLOAD_TIMEOUT_SECS",
        "LOG_TO_STDERR",
        "SOURCE_MAX_RESULTS",
        "WEB_SEARCH_FALLBACK",
        "SERPAPI_API_KEY",
        "ACADEMIC_SEARCH_URL",
    ];

    fn clear_keys() {
        for key in KEYS {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    #[serial]
    fn defaults_apply_when_unset() {
        clear_keys();
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.plagiarism_threshold, 40.0);
        assert_eq!(cfg.lookup_timeout_secs, 30);
        assert_eq!(cfg.source_max_results, 5);
        assert!(cfg.web_search_fallback);
        assert!(!cfg.serpapi_enabled());
        assert!(!cfg.academic_search_enabled());
    }

    #[test]
    #[serial]
    fn malformed_numbers_keep_defaults() {
        clear_keys();
        unsafe {
            env::set_var("PLAGIARISM_THRESHOLD", "forty");
            env::set_var("LOOKUP_TIMEOUT_SECS", "-3");
        }
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.plagiarism_threshold, 40.0);
        assert_eq!(cfg.lookup_timeout_secs, 30);
        clear_keys();
    }

    #[test]
    #[serial]
    fn zero_timeouts_keep_defaults() {
        clear_keys();
        unsafe {
            env::set_var("LOOKUP_TIMEOUT_SECS", "0");
            env::set_var("DOWNLOAD_TIMEOUT_SECS", " 0 ");
        }
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.lookup_timeout_secs, 30);
        assert_eq!(cfg.download_timeout_secs, 30);

        unsafe {
            env::set_var("LOOKUP_TIMEOUT_SECS", "5");
        }
        assert_eq!(AppConfig::from_env().lookup_timeout_secs, 5);
        clear_keys();
    }

    #[test]
    #[serial]
    fn log_to_stderr_flag_is_read() {
        clear_keys();
        assert!(!AppConfig::from_env().log_to_stderr);
        unsafe {
            env::set_var("LOG_TO_STDERR", "true");
        }
        assert!(AppConfig::from_env().log_to_stderr);
        clear_keys();
    }

    #[test]
    #[serial]
    fn env_values_are_read() {
        clear_keys();
        unsafe {
            env::set_var("PLAGIARISM_THRESHOLD", "55.5");
            env::set_var("WEB_SEARCH_FALLBACK", "false");
            env::set_var("ACADEMIC_SEARCH_URL", "http://localhost:6333/search");
        }
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.plagiarism_threshold, 55.5);
        assert!(!cfg.web_search_fallback);
        assert!(cfg.academic_search_enabled());
        clear_keys();
    }

    #[test]
    #[serial]
    fn setters_override_global() {
        clear_keys();
        AppConfig::reset();
        AppConfig::set_plagiarism_threshold(12.5);
        AppConfig::set_serpapi_api_key("key");
        let cfg = AppConfig::global();
        assert_eq!(cfg.plagiarism_threshold, 12.5);
        assert!(cfg.serpapi_enabled());
        AppConfig::reset();
        assert_eq!(AppConfig::global().plagiarism_threshold, 40.0);
    }
}
