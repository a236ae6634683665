use crate::activity::ActivityEvent;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

pub const ENV_INACTIVITY_TIMEOUT_MS: &str = "NETLIFE_INACTIVITY_TIMEOUT_MS";
pub const ENV_WARNING_LEAD_TIME_MS: &str = "NETLIFE_WARNING_LEAD_TIME_MS";
pub const ENV_POLL_INTERVAL_MS: &str = "NETLIFE_POLL_INTERVAL_MS";
pub const ENV_ACTIVITY_EVENTS: &str = "NETLIFE_ACTIVITY_EVENTS";

/// Longest accepted inactivity timeout: one day.
pub const MAX_TIMEOUT_MS: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("warning lead time ({lead_ms} ms) exceeds inactivity timeout ({timeout_ms} ms)")]
    LeadExceedsTimeout { lead_ms: u64, timeout_ms: u64 },

    #[error("poll interval ({poll_ms} ms) exceeds warning lead time ({lead_ms} ms)")]
    PollExceedsLead { poll_ms: u64, lead_ms: u64 },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("inactivity timeout ({timeout_ms} ms) exceeds the maximum of {max_ms} ms")]
    TimeoutTooLong { timeout_ms: u64, max_ms: u64 },

    #[error("activity event set is empty")]
    NoActivityEvents,

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Total idle time after which the session is terminated (in milliseconds)
    pub inactivity_timeout_ms: u64,

    /// How long before the deadline the warning fires (in milliseconds)
    pub warning_lead_time_ms: u64,

    /// How often idle time is re-evaluated (in milliseconds)
    pub poll_interval_ms: u64,

    /// Interaction events that count as activity
    pub activity_events: Vec<ActivityEvent>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_ms: 180_000, // 3 minutes
            warning_lead_time_ms: 60_000,   // warn 1 minute before
            poll_interval_ms: 10_000,
            activity_events: ActivityEvent::default_set().to_vec(),
        }
    }
}

/// Converts milliseconds to a `Duration`, saturating at [`MAX_TIMEOUT_MS`].
fn bounded_millis(ms: u64) -> Duration {
    i64::try_from(ms.min(MAX_TIMEOUT_MS))
        .ok()
        .and_then(Duration::try_milliseconds)
        .unwrap_or(Duration::zero())
}

impl MonitorConfig {
    #[must_use]
    pub fn inactivity_timeout(&self) -> Duration {
        bounded_millis(self.inactivity_timeout_ms)
    }

    #[must_use]
    pub fn warning_lead_time(&self) -> Duration {
        bounded_millis(self.warning_lead_time_ms)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        bounded_millis(self.poll_interval_ms)
    }

    /// Idle duration at which the warning becomes due.
    #[must_use]
    pub fn warning_threshold(&self) -> Duration {
        self.inactivity_timeout() - self.warning_lead_time()
    }

    #[must_use]
    pub fn listens_to(&self, event: ActivityEvent) -> bool {
        self.activity_events.contains(&event)
    }

    /// Checks the ordering constraints between the three durations.
    ///
    /// # Errors
    ///
    /// Returns an error if any duration is zero, if the timeout is longer than
    /// [`MAX_TIMEOUT_MS`], if the warning lead time is longer than the timeout, if the
    /// poll interval is longer than the lead time, or if no activity event is
    /// configured. The lead time is never zero since the poll interval must fit in it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inactivity_timeout_ms == 0 {
            return Err(ConfigError::Zero("inactivity timeout"));
        }
        if self.inactivity_timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::TimeoutTooLong {
                timeout_ms: self.inactivity_timeout_ms,
                max_ms: MAX_TIMEOUT_MS,
            });
        }
        if self.warning_lead_time_ms == 0 {
            return Err(ConfigError::Zero("warning lead time"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Zero("poll interval"));
        }
        if self.warning_lead_time_ms > self.inactivity_timeout_ms {
            return Err(ConfigError::LeadExceedsTimeout {
                lead_ms: self.warning_lead_time_ms,
                timeout_ms: self.inactivity_timeout_ms,
            });
        }
        if self.poll_interval_ms > self.warning_lead_time_ms {
            return Err(ConfigError::PollExceedsLead {
                poll_ms: self.poll_interval_ms,
                lead_ms: self.warning_lead_time_ms,
            });
        }
        if self.activity_events.is_empty() {
            return Err(ConfigError::NoActivityEvents);
        }
        Ok(())
    }

    /// Location of the optional JSON config file, `<config dir>/netlife/monitor.json`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("netlife").join("monitor.json"))
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds the effective configuration: defaults, then the given config file,
    /// then environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is given but cannot be read or parsed, or if the
    /// result fails [`MonitorConfig::validate`].
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                debug!("Loading monitor config from {}", path.display());
                Self::load_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Like [`resolve`](Self::resolve), reading [`default_path`](Self::default_path)
    /// only when that file exists.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    pub fn resolve_default() -> Result<Self, ConfigError> {
        let path = Self::default_path().filter(|path| path.exists());
        Self::resolve(path.as_deref())
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides read through `lookup`. Unparseable values are skipped.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ms) = parse_ms(&lookup, ENV_INACTIVITY_TIMEOUT_MS) {
            self.inactivity_timeout_ms = ms;
        }
        if let Some(ms) = parse_ms(&lookup, ENV_WARNING_LEAD_TIME_MS) {
            self.warning_lead_time_ms = ms;
        }
        if let Some(ms) = parse_ms(&lookup, ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = ms;
        }

        if let Some(raw) = lookup(ENV_ACTIVITY_EVENTS) {
            let parsed: Result<Vec<ActivityEvent>, _> = raw
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(ActivityEvent::from_str)
                .collect();
            match parsed {
                Ok(events) if !events.is_empty() => self.activity_events = events,
                Ok(_) => warn!("{} is empty, keeping configured events", ENV_ACTIVITY_EVENTS),
                Err(e) => warn!("Ignoring {}: {}", ENV_ACTIVITY_EVENTS, e),
            }
        }
    }
}

fn parse_ms<F>(lookup: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(ms),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a number of milliseconds", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.warning_threshold(), Duration::milliseconds(120_000));
        assert_eq!(config.activity_events.len(), 6);
    }

    #[test]
    fn test_validate_rejects_lead_longer_than_timeout() {
        let config = MonitorConfig {
            inactivity_timeout_ms: 30_000,
            warning_lead_time_ms: 60_000,
            poll_interval_ms: 1_000,
            ..MonitorConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::LeadExceedsTimeout { .. })));
    }

    #[test]
    fn test_validate_rejects_poll_longer_than_lead() {
        let config = MonitorConfig {
            poll_interval_ms: 90_000,
            ..MonitorConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::PollExceedsLead { .. })));
    }

    #[test]
    fn test_validate_rejects_zero_and_empty() {
        let zero = MonitorConfig {
            poll_interval_ms: 0,
            ..MonitorConfig::default()
        };
        assert!(matches!(zero.validate(), Err(ConfigError::Zero("poll interval"))));

        let no_warning = MonitorConfig {
            warning_lead_time_ms: 0,
            ..MonitorConfig::default()
        };
        assert!(matches!(no_warning.validate(), Err(ConfigError::Zero("warning lead time"))));

        let empty = MonitorConfig {
            activity_events: vec![],
            ..MonitorConfig::default()
        };
        assert!(matches!(empty.validate(), Err(ConfigError::NoActivityEvents)));
    }

    #[test]
    fn test_overrides_replace_durations() {
        let mut config = MonitorConfig::default();
        config.apply_overrides_from(lookup_from(&[
            (ENV_INACTIVITY_TIMEOUT_MS, "900000"),
            (ENV_WARNING_LEAD_TIME_MS, " 120000 "),
        ]));
        assert_eq!(config.inactivity_timeout_ms, 900_000);
        assert_eq!(config.warning_lead_time_ms, 120_000);
        assert_eq!(config.poll_interval_ms, 10_000);
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let mut config = MonitorConfig::default();
        config.apply_overrides_from(lookup_from(&[
            (ENV_INACTIVITY_TIMEOUT_MS, "soon"),
            (ENV_ACTIVITY_EVENTS, "click,resize"),
        ]));
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_activity_events_override() {
        let mut config = MonitorConfig::default();
        config.apply_overrides_from(lookup_from(&[(ENV_ACTIVITY_EVENTS, "keydown, click")]));
        assert_eq!(config.activity_events, vec![ActivityEvent::KeyPress, ActivityEvent::Click]);
        assert!(config.listens_to(ActivityEvent::Click));
        assert!(!config.listens_to(ActivityEvent::Scroll));
    }

    #[test]
    fn test_load_file_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.json");
        std::fs::write(&path, r#"{ "inactivity_timeout_ms": 600000 }"#).unwrap();

        let config = MonitorConfig::load_file(&path).unwrap();
        assert_eq!(config.inactivity_timeout_ms, 600_000);
        assert_eq!(config.warning_lead_time_ms, 60_000);
        assert_eq!(config.activity_events, ActivityEvent::default_set().to_vec());
    }

    #[test]
    fn test_load_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.json");
        std::fs::write(&path, "not json").unwrap();

        let err = MonitorConfig::load_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("monitor.json"));
    }

    #[test]
    fn test_resolve_without_file_uses_defaults() {
        let config = MonitorConfig::resolve(None).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_reports_missing_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");

        let err = MonitorConfig::resolve(Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_validate_rejects_timeout_above_ceiling() {
        let at_ceiling = MonitorConfig {
            inactivity_timeout_ms: MAX_TIMEOUT_MS,
            ..MonitorConfig::default()
        };
        assert!(at_ceiling.validate().is_ok());
        assert_eq!(at_ceiling.inactivity_timeout(), Duration::days(1));

        for timeout_ms in [MAX_TIMEOUT_MS + 1, i64::MAX.unsigned_abs(), 1 << 63, u64::MAX] {
            let config = MonitorConfig {
                inactivity_timeout_ms: timeout_ms,
                ..MonitorConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::TimeoutTooLong { .. })),
                "{timeout_ms} ms must be rejected"
            );
        }
    }

    #[test]
    fn test_huge_override_is_rejected_not_wrapped() {
        let mut config = MonitorConfig::default();
        config.apply_overrides_from(lookup_from(&[(ENV_INACTIVITY_TIMEOUT_MS, "18446744073709551615")]));
        assert_eq!(config.inactivity_timeout_ms, u64::MAX);
        assert!(matches!(config.validate(), Err(ConfigError::TimeoutTooLong { .. })));

        // durations saturate instead of going negative or panicking
        assert_eq!(config.inactivity_timeout(), Duration::days(1));
        assert!(config.warning_threshold() > Duration::zero());
    }

    #[test]
    fn test_override_beyond_u64_is_ignored() {
        let mut config = MonitorConfig::default();
        config.apply_overrides_from(lookup_from(&[
            (ENV_INACTIVITY_TIMEOUT_MS, "18446744073709551616"),
            (ENV_POLL_INTERVAL_MS, "-5"),
        ]));
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_durations_saturate_for_every_field() {
        let config = MonitorConfig {
            inactivity_timeout_ms: u64::MAX,
            warning_lead_time_ms: 1 << 63,
            poll_interval_ms: i64::MAX.unsigned_abs(),
            ..MonitorConfig::default()
        };
        assert_eq!(config.inactivity_timeout(), Duration::days(1));
        assert_eq!(config.warning_lead_time(), Duration::days(1));
        assert_eq!(config.poll_interval(), Duration::days(1));
    }
}
