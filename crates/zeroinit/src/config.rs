//! Runner configuration.

use zeroinit_core::logging;

/// Environment variable holding a case name filter.
pub const ENV_FILTER: &str = "ZEROINIT_FILTER";
/// Environment variable that stops the run at the first failure when set to `1` or `true`.
pub const ENV_STOP_ON_FAILURE: &str = "ZEROINIT_STOP_ON_FAILURE";
/// Environment variable holding `tracing` filter directives.
pub const ENV_LOG: &str = "ZEROINIT_LOG";

/// Configuration for a [`Runner`](crate::Runner).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Only run cases whose name contains this substring.
    pub filter: Option<String>,
    /// Stop after the first failing case.
    pub stop_on_failure: bool,
    /// Ask the device to release memory after a case is skipped for running out of it.
    pub reclaim_on_oom: bool,
    /// Directives for the log subscriber. `RUST_LOG` still wins when set.
    pub log_filter: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            filter: None,
            stop_on_failure: false,
            reclaim_on_oom: true,
            log_filter: None,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `ZEROINIT_FILTER`, `ZEROINIT_STOP_ON_FAILURE` and `ZEROINIT_LOG`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(filter) = lookup(ENV_FILTER).filter(|f| !f.is_empty()) {
            config.filter = Some(filter);
        }
        if let Some(flag) = lookup(ENV_STOP_ON_FAILURE) {
            config.stop_on_failure = parse_flag(&flag);
        }
        if let Some(directives) = lookup(ENV_LOG).filter(|d| !d.is_empty()) {
            config.log_filter = Some(directives);
        }
        config
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    pub fn reclaim_on_oom(mut self, reclaim: bool) -> Self {
        self.reclaim_on_oom = reclaim;
        self
    }

    pub fn log_filter(mut self, directives: impl Into<String>) -> Self {
        self.log_filter = Some(directives.into());
        self
    }

    /// Whether a case with this name is selected.
    pub fn matches(&self, name: &str) -> bool {
        self.filter.as_deref().is_none_or(|filter| name.contains(filter))
    }

    /// Install the log subscriber with this configuration's filter.
    pub fn init_logging(&self) {
        logging::init_with_filter(self.log_filter.as_deref().unwrap_or(logging::DEFAULT_FILTER));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeroinit_core::alloc::HashMap;

    #[test]
    fn test_defaults() {
        let config = RunnerConfig::default();
        assert!(config.reclaim_on_oom);
        assert!(!config.stop_on_failure);
        assert!(config.matches("anything"));
    }

    #[test]
    fn test_from_lookup() {
        let mut env = HashMap::new();
        env.insert(ENV_FILTER, "format=Rgba8Unorm".to_string());
        env.insert(ENV_STOP_ON_FAILURE, "TRUE".to_string());
        env.insert(ENV_LOG, String::new());

        let config = RunnerConfig::from_lookup(|key| env.get(key).cloned());
        assert_eq!(config.filter.as_deref(), Some("format=Rgba8Unorm"));
        assert!(config.stop_on_failure);
        assert_eq!(config.log_filter, None);
        assert!(config.matches("x:format=Rgba8Unorm;y"));
        assert!(!config.matches("x:format=R8Unorm;y"));
    }

    #[test]
    fn test_builder() {
        let config = RunnerConfig::new()
            .filter("D3")
            .stop_on_failure(true)
            .reclaim_on_oom(false)
            .log_filter("debug");
        assert_eq!(config.filter.as_deref(), Some("D3"));
        assert!(config.stop_on_failure);
        assert!(!config.reclaim_on_oom);
        assert_eq!(config.log_filter.as_deref(), Some("debug"));
    }
}
