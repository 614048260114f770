use std::{env, str::FromStr, time::Duration};

use model::position::Position;

use crate::MapError;

/// Camera policy constants.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportConfig {
    /// Zoom level every fly transition targets.
    pub target_zoom: f64,
    /// Duration of the fly on the first fix.
    pub fly_duration: Duration,
    /// Duration of the fly on an explicit recenter. Shorter than `fly_duration`.
    pub recenter_duration: Duration,
    /// Pixels kept free on each side when fitting bounds.
    pub fit_padding: (u32, u32),
    /// View before the first fix arrives.
    pub default_center: Position,
    pub default_zoom: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            target_zoom: 16.0,
            fly_duration: Duration::from_millis(1500),
            recenter_duration: Duration::from_millis(1000),
            fit_padding: (50, 50),
            default_center: Position::new(20.5937, 78.9629),
            default_zoom: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackingConfig {
    /// `None` waits for the initial read forever.
    pub initial_read_timeout: Option<Duration>,
    /// How often a dropped subscription is reopened before giving up.
    pub resubscribe_attempts: u32,
    /// Base delay between resubscription attempts, grows linearly.
    pub resubscribe_backoff: Duration,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            initial_read_timeout: None,
            resubscribe_attempts: 5,
            resubscribe_backoff: Duration::from_secs(2),
        }
    }
}

impl TrackingConfig {
    pub(crate) fn backoff(&self, last_backoff: Duration) -> Duration {
        last_backoff + self.resubscribe_backoff
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapConfig {
    pub viewport: ViewportConfig,
    pub tracking: TrackingConfig,
}

impl MapConfig {
    /// Reads overrides from `LIVE_MAP_*` environment variables, unset
    /// variables keep their defaults.
    pub fn from_env() -> Result<Self, MapError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, MapError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(zoom) = parse(&lookup, "LIVE_MAP_TARGET_ZOOM")? {
            config.viewport.target_zoom = zoom;
        }
        if let Some(secs) = parse::<f64, _>(&lookup, "LIVE_MAP_FLY_SECS")? {
            config.viewport.fly_duration = secs_to_duration("LIVE_MAP_FLY_SECS", secs)?;
        }
        if let Some(secs) = parse::<f64, _>(&lookup, "LIVE_MAP_RECENTER_SECS")? {
            config.viewport.recenter_duration =
                secs_to_duration("LIVE_MAP_RECENTER_SECS", secs)?;
        }
        if let Some(padding) = parse(&lookup, "LIVE_MAP_FIT_PADDING")? {
            config.viewport.fit_padding = (padding, padding);
        }
        if let Some(secs) = parse::<f64, _>(&lookup, "LIVE_MAP_INITIAL_READ_TIMEOUT_SECS")? {
            config.tracking.initial_read_timeout = Some(secs_to_duration(
                "LIVE_MAP_INITIAL_READ_TIMEOUT_SECS",
                secs,
            )?);
        }
        if let Some(attempts) = parse(&lookup, "LIVE_MAP_RESUBSCRIBE_ATTEMPTS")? {
            config.tracking.resubscribe_attempts = attempts;
        }
        if let Some(secs) = parse::<f64, _>(&lookup, "LIVE_MAP_RESUBSCRIBE_BACKOFF_SECS")? {
            config.tracking.resubscribe_backoff =
                secs_to_duration("LIVE_MAP_RESUBSCRIBE_BACKOFF_SECS", secs)?;
        }
        Ok(config)
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, MapError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| MapError::InvalidConfig { key, value }),
        None => Ok(None),
    }
}

fn secs_to_duration(key: &'static str, secs: f64) -> Result<Duration, MapError> {
    Duration::try_from_secs_f64(secs).map_err(|_| MapError::InvalidConfig {
        key,
        value: secs.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        let config = MapConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, MapConfig::default());
        assert!(config.viewport.recenter_duration < config.viewport.fly_duration);
        assert_eq!(config.tracking.initial_read_timeout, None);
    }

    #[test]
    fn overrides_are_applied() {
        let config = MapConfig::from_lookup(lookup(&[
            ("LIVE_MAP_TARGET_ZOOM", "15"),
            ("LIVE_MAP_INITIAL_READ_TIMEOUT_SECS", "2.5"),
            ("LIVE_MAP_RESUBSCRIBE_ATTEMPTS", "1"),
        ]))
        .unwrap();
        assert_eq!(config.viewport.target_zoom, 15.0);
        assert_eq!(
            config.tracking.initial_read_timeout,
            Some(Duration::from_millis(2500))
        );
        assert_eq!(config.tracking.resubscribe_attempts, 1);
    }

    #[test]
    fn malformed_values_are_reported() {
        let result = MapConfig::from_lookup(lookup(&[("LIVE_MAP_FLY_SECS", "-1")]));
        assert!(matches!(
            result,
            Err(MapError::InvalidConfig {
                key: "LIVE_MAP_FLY_SECS",
                ..
            })
        ));
        let result = MapConfig::from_lookup(lookup(&[("LIVE_MAP_TARGET_ZOOM", "far")]));
        assert!(result.is_err());
    }
}
