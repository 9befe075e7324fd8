//! Environment driven configuration for the dashboard binary
//!
//! | Variable | Default |
//! |---|---|
//! | `MONITOR_URL` | `http://localhost:8080/trades/monitor` |
//! | `POLL_INTERVAL_SECS` | `60` |
//! | `POSITION_SCALE` | `fraction` (or `percent`) |
//! | `ZONE_MONITOR_LOG` | unset: logging disabled |

use std::path::PathBuf;
use std::time::Duration;

use crate::shared::aggregation::PositionScale;
use crate::shared::error::{MonitorError, Result};
use crate::shared::poller::PollerConfig;

/// Resolved dashboard configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorConfig {
    pub poller: PollerConfig,
    pub position_scale: PositionScale,
    /// File receiving `tracing` output; the terminal belongs to the UI
    pub log_file: Option<PathBuf>,
}

impl MonitorConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, treating blank values as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get("MONITOR_URL") {
            config.poller = config.poller.with_url(url.trim());
        }

        if let Some(secs) = get("POLL_INTERVAL_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                MonitorError::Config(format!("POLL_INTERVAL_SECS must be an integer, got '{secs}'"))
            })?;
            if secs == 0 {
                return Err(MonitorError::Config(
                    "POLL_INTERVAL_SECS must be greater than zero".to_string(),
                ));
            }
            config.poller = config.poller.with_poll_interval(Duration::from_secs(secs));
        }

        if let Some(scale) = get("POSITION_SCALE") {
            config.position_scale = scale.parse()?;
        }

        config.log_file = get("ZONE_MONITOR_LOG").map(PathBuf::from);

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.poller.url, "http://localhost:8080/trades/monitor");
        assert_eq!(config.poller.poll_interval, Duration::from_secs(60));
        assert_eq!(config.position_scale, PositionScale::Fraction);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = MonitorConfig::from_lookup(lookup(&[
            ("MONITOR_URL", "http://10.0.0.5:8080/trades/monitor"),
            ("POLL_INTERVAL_SECS", "15"),
            ("POSITION_SCALE", "percent"),
            ("ZONE_MONITOR_LOG", "/tmp/zone-monitor.log"),
        ]))
        .unwrap();

        assert_eq!(config.poller.url, "http://10.0.0.5:8080/trades/monitor");
        assert_eq!(config.poller.poll_interval, Duration::from_secs(15));
        assert_eq!(config.position_scale, PositionScale::Percent);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/zone-monitor.log")));
    }

    #[test]
    fn test_invalid_values() {
        for vars in [
            [("POLL_INTERVAL_SECS", "0")],
            [("POLL_INTERVAL_SECS", "soon")],
            [("POSITION_SCALE", "log")],
        ] {
            let result = MonitorConfig::from_lookup(lookup(&vars));
            assert!(matches!(result, Err(MonitorError::Config(_))), "{:?}", vars);
        }
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = MonitorConfig::from_lookup(lookup(&[("MONITOR_URL", "  ")])).unwrap();
        assert_eq!(config.poller.url, "http://localhost:8080/trades/monitor");
    }
}
