use anyhow::Result;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Remote API
    pub api_url: String,
    pub api_token: Option<String>,
    pub request_timeout: Duration,

    // Undo history
    pub undo_history_size: usize,
    pub recent_change_window: Duration,

    // Notifications
    pub notify_success_duration: Duration,
    pub notify_error_duration: Duration,

    // Table view
    pub filter_debounce: Duration,
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000/api".to_string(),
            api_token: None,
            request_timeout: Duration::from_secs(30),
            undo_history_size: 10,
            recent_change_window: Duration::from_millis(5000),
            notify_success_duration: Duration::from_millis(5000),
            notify_error_duration: Duration::from_millis(8000),
            filter_debounce: Duration::from_millis(300),
            page_size: 25,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let undo_history_size = match std::env::var("UNDO_HISTORY_SIZE")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            Some(0) => anyhow::bail!("UNDO_HISTORY_SIZE must be at least 1"),
            Some(size) => size,
            None => defaults.undo_history_size,
        };

        Ok(Self {
            // Remote API
            api_url: std::env::var("REVIEW_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            api_token: std::env::var("REVIEW_API_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
            request_timeout: env_secs("REQUEST_TIMEOUT_SECS").unwrap_or(defaults.request_timeout),

            // Undo history
            undo_history_size,
            recent_change_window: env_millis("RECENT_CHANGE_WINDOW_MS")
                .unwrap_or(defaults.recent_change_window),

            // Notifications
            notify_success_duration: env_millis("NOTIFY_SUCCESS_MS")
                .unwrap_or(defaults.notify_success_duration),
            notify_error_duration: env_millis("NOTIFY_ERROR_MS")
                .unwrap_or(defaults.notify_error_duration),

            // Table view
            filter_debounce: env_millis("FILTER_DEBOUNCE_MS").unwrap_or(defaults.filter_debounce),
            page_size: std::env::var("PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or(defaults.page_size),
        })
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 9] = [
        "REVIEW_API_URL",
        "REVIEW_API_TOKEN",
        "REQUEST_TIMEOUT_SECS",
        "UNDO_HISTORY_SIZE",
        "RECENT_CHANGE_WINDOW_MS",
        "NOTIFY_SUCCESS_MS",
        "NOTIFY_ERROR_MS",
        "FILTER_DEBOUNCE_MS",
        "PAGE_SIZE",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = Config::from_env().expect("defaults load");

        assert_eq!(config.api_url, "http://localhost:5000/api");
        assert!(config.api_token.is_none());
        assert_eq!(config.undo_history_size, 10);
        assert_eq!(config.recent_change_window, Duration::from_millis(5000));
        assert_eq!(config.notify_success_duration, Duration::from_millis(5000));
        assert_eq!(config.notify_error_duration, Duration::from_millis(8000));
        assert_eq!(config.filter_debounce, Duration::from_millis(300));
        assert_eq!(config.page_size, 25);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("REVIEW_API_URL", "https://review.example.com/api/");
        std::env::set_var("REVIEW_API_TOKEN", "secret");
        std::env::set_var("UNDO_HISTORY_SIZE", "3");
        std::env::set_var("NOTIFY_ERROR_MS", "12000");
        std::env::set_var("PAGE_SIZE", "50");

        let config = Config::from_env().expect("overrides load");
        clear_env();

        assert_eq!(config.api_url, "https://review.example.com/api");
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(config.undo_history_size, 3);
        assert_eq!(config.notify_error_duration, Duration::from_millis(12000));
        assert_eq!(config.page_size, 50);
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_zero_history() {
        clear_env();
        std::env::set_var("UNDO_HISTORY_SIZE", "0");
        let result = Config::from_env();
        clear_env();

        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_numbers_fall_back() {
        clear_env();
        std::env::set_var("FILTER_DEBOUNCE_MS", "soon");
        std::env::set_var("UNDO_HISTORY_SIZE", "abc");
        std::env::set_var("PAGE_SIZE", "0");
        std::env::set_var("REVIEW_API_TOKEN", "   ");

        let config = Config::from_env().expect("falls back");
        clear_env();

        assert_eq!(config.filter_debounce, Duration::from_millis(300));
        assert_eq!(config.undo_history_size, 10);
        assert_eq!(config.page_size, 25);
        assert!(config.api_token.is_none());
    }
}
