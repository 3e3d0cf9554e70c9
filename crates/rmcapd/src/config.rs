use rmcap_core::SensorKind;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_SENSORS: &str = "left-front,left-left,right-front,right-right,depth-ahat";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: {source}")]
    SensorName {
        var: &'static str,
        #[source]
        source: rmcap_core::types::ParseSensorKindError,
    },
    #[error("no sensors configured")]
    NoSensors,
    #[error("failed to read sensor profile {path}: {source}")]
    ProfileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid sensor profile {path}: {source}")]
    ProfileParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// One sensor to open and its capture cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorConfig {
    pub kind: SensorKind,
    pub interval: Duration,
}

/// Daemon configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Sensors to capture from, in start order.
    pub sensors: Vec<SensorConfig>,
    /// Period between status log lines.
    pub status_interval: Duration,
    /// Consecutive failed iterations before a sensor is reported stalled.
    pub stall_after: u64,
    /// Row alignment, in bytes, of the host textures.
    pub row_alignment: u32,
}

/// TOML sensor profile pointed at by `RMCAP_CONFIG`.
///
/// ```toml
/// [[sensor]]
/// kind = "left-front"
/// interval_ms = 50
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Profile {
    #[serde(default)]
    sensor: Vec<ProfileSensor>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileSensor {
    kind: SensorKind,
    interval_ms: Option<u64>,
}

impl Config {
    /// Load configuration from `RMCAP_*` environment variables with defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let frame_interval =
            Duration::from_millis(parse_or(&lookup, "RMCAP_FRAME_INTERVAL_MS", 33));

        let sensors = match lookup("RMCAP_CONFIG") {
            Some(path) => {
                let path = PathBuf::from(path);
                let text = std::fs::read_to_string(&path).map_err(|source| {
                    ConfigError::ProfileRead {
                        path: path.clone(),
                        source,
                    }
                })?;
                sensors_from_profile(&text, frame_interval)
                    .map_err(|source| ConfigError::ProfileParse { path, source })?
            }
            None => {
                let names = lookup("RMCAP_SENSORS").unwrap_or_else(|| DEFAULT_SENSORS.to_string());
                parse_sensor_list(&names, frame_interval)?
            }
        };
        if sensors.is_empty() {
            return Err(ConfigError::NoSensors);
        }

        Ok(Self {
            sensors,
            status_interval: Duration::from_secs(parse_or(&lookup, "RMCAP_STATUS_INTERVAL_SECS", 5)),
            stall_after: parse_or(&lookup, "RMCAP_STALL_AFTER", 30),
            row_alignment: parse_or(&lookup, "RMCAP_ROW_ALIGNMENT", 256),
        })
    }
}

fn parse_sensor_list(names: &str, interval: Duration) -> Result<Vec<SensorConfig>, ConfigError> {
    let mut sensors: Vec<SensorConfig> = Vec::new();
    for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let kind = name.parse().map_err(|source| ConfigError::SensorName {
            var: "RMCAP_SENSORS",
            source,
        })?;
        if sensors.iter().any(|s| s.kind == kind) {
            tracing::warn!(sensor = %kind, "sensor listed twice; ignoring duplicate");
            continue;
        }
        sensors.push(SensorConfig { kind, interval });
    }
    Ok(sensors)
}

fn sensors_from_profile(
    text: &str,
    default_interval: Duration,
) -> Result<Vec<SensorConfig>, toml::de::Error> {
    let profile: Profile = toml::from_str(text)?;
    Ok(profile
        .sensor
        .into_iter()
        .map(|s| SensorConfig {
            kind: s.kind,
            interval: s
                .interval_ms
                .map(Duration::from_millis)
                .unwrap_or(default_interval),
        })
        .collect())
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}
