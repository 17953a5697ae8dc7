use std::collections::BTreeMap;

use crate::logging::{LogLevel, DEFAULT_LOG_LEVEL};

pub const KEYS: [&str; 8] = [
    "SAMPLE_INTERVAL_MS",
    "VISIBILITY_DEADBAND",
    "DIRECTION_MIN_DELTA_PX",
    "DIRECTION_INTERVAL_MS",
    "SOMNLOGG_CONFIRM_MS",
    "MOBILE_BREAKPOINT_PX",
    "VISIBILITY_FLOOR",
    "LOG_LEVEL",
];

pub const DEFAULT_SAMPLE_INTERVAL_MS: f64 = 100.0;
pub const DEFAULT_VISIBILITY_DEADBAND: f64 = 0.01;
pub const DEFAULT_DIRECTION_MIN_DELTA_PX: f64 = 15.0;
pub const DEFAULT_DIRECTION_INTERVAL_MS: f64 = 100.0;
pub const DEFAULT_SOMNLOGG_CONFIRM_MS: f64 = 2_500.0;
pub const DEFAULT_MOBILE_BREAKPOINT_PX: f64 = 768.0;
pub const DEFAULT_VISIBILITY_FLOOR: f64 = 0.05;

const SAMPLE_INTERVAL_MS_BOUNDS: (f64, f64) = (16.0, 1_000.0);
const VISIBILITY_DEADBAND_BOUNDS: (f64, f64) = (0.0, 0.1);
const DIRECTION_MIN_DELTA_PX_BOUNDS: (f64, f64) = (1.0, 200.0);
const DIRECTION_INTERVAL_MS_BOUNDS: (f64, f64) = (16.0, 1_000.0);
const SOMNLOGG_CONFIRM_MS_BOUNDS: (f64, f64) = (0.0, 10_000.0);
const MOBILE_BREAKPOINT_PX_BOUNDS: (f64, f64) = (320.0, 2_048.0);
const VISIBILITY_FLOOR_BOUNDS: (f64, f64) = (0.0, 0.5);

/// Runtime tunables shared by every tracker on the page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackingConfig {
    pub sample_interval_ms: f64,
    pub visibility_deadband: f64,
    pub direction_min_delta_px: f64,
    pub direction_interval_ms: f64,
    pub somnlogg_confirm_ms: f64,
    pub mobile_breakpoint_px: f64,
    pub visibility_floor: f64,
    pub log_level: LogLevel,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            visibility_deadband: DEFAULT_VISIBILITY_DEADBAND,
            direction_min_delta_px: DEFAULT_DIRECTION_MIN_DELTA_PX,
            direction_interval_ms: DEFAULT_DIRECTION_INTERVAL_MS,
            somnlogg_confirm_ms: DEFAULT_SOMNLOGG_CONFIRM_MS,
            mobile_breakpoint_px: DEFAULT_MOBILE_BREAKPOINT_PX,
            visibility_floor: DEFAULT_VISIBILITY_FLOOR,
            log_level: DEFAULT_LOG_LEVEL,
        }
    }
}

impl TrackingConfig {
    /// Reads every key through `lookup`. Keys use the upper snake case names
    /// (`SAMPLE_INTERVAL_MS`); callers map them onto their own source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            sample_interval_ms: parse_f64_with_bounds(
                lookup("SAMPLE_INTERVAL_MS"),
                DEFAULT_SAMPLE_INTERVAL_MS,
                SAMPLE_INTERVAL_MS_BOUNDS,
            ),
            visibility_deadband: parse_f64_with_bounds(
                lookup("VISIBILITY_DEADBAND"),
                DEFAULT_VISIBILITY_DEADBAND,
                VISIBILITY_DEADBAND_BOUNDS,
            ),
            direction_min_delta_px: parse_f64_with_bounds(
                lookup("DIRECTION_MIN_DELTA_PX"),
                DEFAULT_DIRECTION_MIN_DELTA_PX,
                DIRECTION_MIN_DELTA_PX_BOUNDS,
            ),
            direction_interval_ms: parse_f64_with_bounds(
                lookup("DIRECTION_INTERVAL_MS"),
                DEFAULT_DIRECTION_INTERVAL_MS,
                DIRECTION_INTERVAL_MS_BOUNDS,
            ),
            somnlogg_confirm_ms: parse_f64_with_bounds(
                lookup("SOMNLOGG_CONFIRM_MS"),
                DEFAULT_SOMNLOGG_CONFIRM_MS,
                SOMNLOGG_CONFIRM_MS_BOUNDS,
            ),
            mobile_breakpoint_px: parse_f64_with_bounds(
                lookup("MOBILE_BREAKPOINT_PX"),
                DEFAULT_MOBILE_BREAKPOINT_PX,
                MOBILE_BREAKPOINT_PX_BOUNDS,
            ),
            visibility_floor: parse_f64_with_bounds(
                lookup("VISIBILITY_FLOOR"),
                DEFAULT_VISIBILITY_FLOOR,
                VISIBILITY_FLOOR_BOUNDS,
            ),
            log_level: lookup("LOG_LEVEL")
                .as_deref()
                .and_then(LogLevel::parse)
                .unwrap_or(DEFAULT_LOG_LEVEL),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(parse_env_non_empty_string)
    }

    /// Every key with its effective value, in the form `from_lookup` reads back.
    pub fn entries(&self) -> BTreeMap<&'static str, String> {
        let values = [
            self.sample_interval_ms.to_string(),
            self.visibility_deadband.to_string(),
            self.direction_min_delta_px.to_string(),
            self.direction_interval_ms.to_string(),
            self.somnlogg_confirm_ms.to_string(),
            self.mobile_breakpoint_px.to_string(),
            self.visibility_floor.to_string(),
            self.log_level.as_str().to_string(),
        ];
        KEYS.into_iter().zip(values).collect()
    }

    /// Maps `SAMPLE_INTERVAL_MS` to the `data-sample-interval-ms` attribute name.
    pub fn data_attribute_name(key: &str) -> String {
        format!("data-{}", key.to_ascii_lowercase().replace('_', "-"))
    }
}

fn parse_f64_with_bounds(raw: Option<String>, default: f64, bounds: (f64, f64)) -> f64 {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .filter(|value| (bounds.0..=bounds.1).contains(value))
        .unwrap_or(default)
}

fn parse_env_non_empty_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
