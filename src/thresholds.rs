use crate::direction::ScrollDirection;
use crate::error::ConfigError;

/// Hysteresis band: a section becomes active at `enter` and stays active
/// until it drops below `exit`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Band {
    pub enter: f64,
    pub exit: f64,
}

impl Band {
    pub const fn new(enter: f64, exit: f64) -> Self {
        Self { enter, exit }
    }

    fn validate(self) -> Result<Self, ConfigError> {
        let in_unit = |value: f64| value.is_finite() && (0.0..=1.0).contains(&value);

        if in_unit(self.enter) && in_unit(self.exit) && self.exit <= self.enter {
            Ok(self)
        } else {
            Err(ConfigError::InvalidBand {
                enter: self.enter,
                exit: self.exit,
            })
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ThresholdConfig {
    Uniform(Band),
    Directional { down: Band, up: Band },
}

impl ThresholdConfig {
    /// Default bands for section detection: arriving sections must be more
    /// visible while scrolling down than while scrolling up.
    pub const DETECTION: Self = Self::Directional {
        down: Band::new(0.6, 0.3),
        up: Band::new(0.4, 0.2),
    };
}

/// Thresholds with the direction lookup already flattened.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedThresholds {
    down: Band,
    up: Band,
}

impl ResolvedThresholds {
    pub fn resolve(config: ThresholdConfig) -> Result<Self, ConfigError> {
        let (down, up) = match config {
            ThresholdConfig::Uniform(band) => (band, band),
            ThresholdConfig::Directional { down, up } => (down, up),
        };

        Ok(Self {
            down: down.validate()?,
            up: up.validate()?,
        })
    }

    pub fn band(&self, direction: ScrollDirection) -> Band {
        match direction {
            ScrollDirection::Down => self.down,
            ScrollDirection::Up => self.up,
        }
    }
}
