use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;

use crate::config::TrackingConfig;
use crate::direction::{ScrollDirection, ScrollDirectionTracker};
use crate::error::ConfigError;
use crate::logging::{log_event, LogLevel};
use crate::measurement::{SamplerSettings, SectionRect, VisibilityMode, VisibilitySampler};
use crate::resolver::{ResolverSettings, SectionActivityResolver, TieBreak};
use crate::thresholds::ThresholdConfig;
use crate::tracker::{Refresh, ScrollSubscriber, Viewport};

#[derive(Clone, Debug, PartialEq)]
pub struct DetectionConfig {
    pub section_ids: Vec<String>,
    pub thresholds: ThresholdConfig,
    pub tracking: TrackingConfig,
}

impl DetectionConfig {
    pub fn new<I, S>(section_ids: I, tracking: TrackingConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            section_ids: section_ids.into_iter().map(Into::into).collect(),
            thresholds: ThresholdConfig::DETECTION,
            tracking,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSnapshot {
    pub current_section: String,
    pub scroll_direction: ScrollDirection,
    pub visibilities: BTreeMap<String, f64>,
    pub active_sections: Vec<String>,
}

/// Section-relative detection with direction-dependent hysteresis. The
/// current section is the first active one in declaration order.
#[derive(Debug)]
pub struct SectionDetection {
    sampler: VisibilitySampler,
    direction: ScrollDirectionTracker,
    resolver: SectionActivityResolver,
    snapshot: DetectionSnapshot,
}

impl SectionDetection {
    pub fn new(config: &DetectionConfig) -> Result<Self, ConfigError> {
        let tracking = config.tracking;
        let sampler = VisibilitySampler::new(
            config.section_ids.clone(),
            SamplerSettings {
                mode: VisibilityMode::SectionRelative,
                min_interval_ms: tracking.sample_interval_ms,
                deadband: tracking.visibility_deadband,
            },
        )?;
        let resolver = SectionActivityResolver::new(
            config.section_ids.clone(),
            ResolverSettings {
                thresholds: config.thresholds,
                tie_break: TieBreak::DeclarationOrder,
                fallback_floor: tracking.visibility_floor,
            },
        )?;

        Ok(Self {
            snapshot: DetectionSnapshot {
                current_section: resolver.current_section().to_string(),
                scroll_direction: ScrollDirection::Down,
                visibilities: BTreeMap::new(),
                active_sections: Vec::new(),
            },
            sampler,
            direction: ScrollDirectionTracker::new(
                tracking.direction_min_delta_px,
                tracking.direction_interval_ms,
            ),
            resolver,
        })
    }

    pub fn snapshot(&self) -> &DetectionSnapshot {
        &self.snapshot
    }

    pub fn visibility(&self, section_id: &str) -> f64 {
        self.sampler.visibility(section_id)
    }

    pub fn direction(&self) -> ScrollDirection {
        self.direction.direction()
    }

    fn resolve(&mut self) -> bool {
        let direction = self.direction.direction();
        self.resolver.update(self.sampler.measurements(), direction);

        let next = DetectionSnapshot {
            current_section: self.resolver.current_section().to_string(),
            scroll_direction: direction,
            visibilities: self
                .sampler
                .measurements()
                .iter()
                .map(|(id, measurement)| (id.clone(), measurement.visibility))
                .collect(),
            active_sections: self
                .sampler
                .section_ids()
                .iter()
                .filter(|id| self.resolver.is_active(id))
                .cloned()
                .collect(),
        };

        if next == self.snapshot {
            return false;
        }
        self.snapshot = next;
        true
    }
}

impl ScrollSubscriber for SectionDetection {
    fn section_ids(&self) -> &[String] {
        self.sampler.section_ids()
    }

    fn on_scroll(&mut self, now_ms: f64, scroll_y: f64) -> bool {
        let Some(direction) = self.direction.observe(now_ms, scroll_y) else {
            return false;
        };

        log_event(
            LogLevel::Debug,
            "scroll_direction_changed",
            json!({ "tracker": "detection", "direction": direction.as_str() }),
        );
        self.resolve()
    }

    fn on_sample(
        &mut self,
        now_ms: f64,
        viewport: Viewport,
        locate: &dyn Fn(&str) -> Option<SectionRect>,
    ) -> Refresh {
        let refresh = Refresh::from_sample(self.sampler.sample(now_ms, viewport.height, locate));
        if !refresh.changed {
            return refresh;
        }
        Refresh {
            changed: self.resolve(),
            ..refresh
        }
    }
}
