//! Navigation bar tracker: which section the nav should highlight.
//!
//! Visibility is measured against the viewport height and the current section
//! is the strictly most visible one among those holding the navigation band,
//! so a short section that is fully on screen does not steal the highlight
//! from a tall one filling the viewport.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;

use crate::config::TrackingConfig;
use crate::direction::{ScrollDirection, ScrollDirectionTracker};
use crate::error::ConfigError;
use crate::logging::{log_event, LogLevel};
use crate::measurement::{SamplerSettings, SectionRect, VisibilityMode, VisibilitySampler};
use crate::resolver::{ResolverSettings, SectionActivityResolver, TieBreak};
use crate::thresholds::{Band, ThresholdConfig};
use crate::tracker::{Refresh, ScrollSubscriber, Viewport};

const NAVIGATION_BAND: Band = Band::new(0.5, 0.2);

#[derive(Clone, Debug, PartialEq)]
pub struct NavigationConfig {
    pub section_ids: Vec<String>,
    pub hero_section_id: String,
    pub tracking: TrackingConfig,
}

impl NavigationConfig {
    /// The first id doubles as the hero section.
    pub fn new<I, S>(section_ids: I, tracking: TrackingConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let section_ids: Vec<String> = section_ids.into_iter().map(Into::into).collect();
        let hero_section_id = section_ids.first().cloned().unwrap_or_default();

        Self {
            section_ids,
            hero_section_id,
            tracking,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationSnapshot {
    pub current_section: String,
    pub scroll_direction: ScrollDirection,
    pub section_visibilities: BTreeMap<String, f64>,
    pub hero_visibility: f64,
}

impl NavigationSnapshot {
    pub fn initial(config: &NavigationConfig) -> Self {
        Self {
            current_section: config.section_ids.first().cloned().unwrap_or_default(),
            scroll_direction: ScrollDirection::Down,
            section_visibilities: BTreeMap::new(),
            hero_visibility: 0.0,
        }
    }
}

#[derive(Debug)]
pub struct SectionNavigation {
    hero_section_id: String,
    sampler: VisibilitySampler,
    direction: ScrollDirectionTracker,
    resolver: SectionActivityResolver,
    snapshot: NavigationSnapshot,
}

impl SectionNavigation {
    pub fn new(config: &NavigationConfig) -> Result<Self, ConfigError> {
        let tracking = config.tracking;
        let sampler = VisibilitySampler::new(
            config.section_ids.clone(),
            SamplerSettings {
                mode: VisibilityMode::ViewportRelative,
                min_interval_ms: tracking.sample_interval_ms,
                deadband: tracking.visibility_deadband,
            },
        )?;
        let resolver = SectionActivityResolver::new(
            config.section_ids.clone(),
            ResolverSettings {
                thresholds: ThresholdConfig::Uniform(NAVIGATION_BAND),
                tie_break: TieBreak::MaxVisibility {
                    floor: tracking.visibility_floor,
                },
                fallback_floor: tracking.visibility_floor,
            },
        )?;

        Ok(Self {
            hero_section_id: config.hero_section_id.clone(),
            sampler,
            direction: ScrollDirectionTracker::new(
                tracking.direction_min_delta_px,
                tracking.direction_interval_ms,
            ),
            snapshot: NavigationSnapshot::initial(config),
            resolver,
        })
    }

    pub fn snapshot(&self) -> &NavigationSnapshot {
        &self.snapshot
    }

    fn resolve(&mut self) -> bool {
        let direction = self.direction.direction();
        self.resolver.update(self.sampler.measurements(), direction);

        let next = NavigationSnapshot {
            current_section: self.resolver.current_section().to_string(),
            scroll_direction: direction,
            section_visibilities: self
                .sampler
                .measurements()
                .iter()
                .map(|(id, measurement)| (id.clone(), measurement.visibility))
                .collect(),
            hero_visibility: self.sampler.visibility(&self.hero_section_id),
        };

        if next == self.snapshot {
            return false;
        }
        self.snapshot = next;
        true
    }
}

impl ScrollSubscriber for SectionNavigation {
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
            json!({ "tracker": "navigation", "direction": direction.as_str() }),
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const VIEWPORT: Viewport = Viewport {
        width: 1_280.0,
        height: 800.0,
    };

    /// Sections stacked from the top of the document, scrolled by `scroll_y`.
    fn layout(scroll_y: f64) -> HashMap<String, SectionRect> {
        let heights = [("hero", 900.0), ("skills", 1_200.0), ("somnlogg", 700.0), ("qna", 600.0)];
        let mut top = -scroll_y;
        heights
            .iter()
            .map(|(id, height)| {
                let rect = SectionRect::new(top, top + height);
                top += height;
                (id.to_string(), rect)
            })
            .collect()
    }

    fn navigation() -> SectionNavigation {
        SectionNavigation::new(&NavigationConfig::new(
            ["hero", "skills", "somnlogg", "qna"],
            TrackingConfig::default(),
        ))
        .expect("valid config")
    }

    fn scroll_to(nav: &mut SectionNavigation, now_ms: f64, scroll_y: f64) -> Refresh {
        nav.on_scroll(now_ms, scroll_y);
        let rects = layout(scroll_y);
        nav.on_sample(now_ms, VIEWPORT, &|id| rects.get(id).copied())
    }

    #[test]
    fn initial_snapshot_points_at_hero() {
        let nav = navigation();
        let snapshot = nav.snapshot();

        assert_eq!(snapshot.current_section, "hero");
        assert_eq!(snapshot.scroll_direction, ScrollDirection::Down);
        assert!(snapshot.section_visibilities.is_empty());
    }

    #[test]
    fn highlight_follows_the_section_filling_the_viewport() {
        let mut nav = navigation();

        assert!(scroll_to(&mut nav, 0.0, 0.0).changed);
        assert_eq!(nav.snapshot().current_section, "hero");
        assert_eq!(nav.snapshot().hero_visibility, 1.0);

        scroll_to(&mut nav, 200.0, 700.0);
        assert_eq!(nav.snapshot().current_section, "skills");
        assert_eq!(nav.snapshot().section_visibilities["skills"], 0.75);

        scroll_to(&mut nav, 400.0, 2_000.0);
        assert_eq!(nav.snapshot().current_section, "somnlogg");
    }

    #[test]
    fn snapshot_serializes_with_consumer_field_names() {
        let mut nav = navigation();
        scroll_to(&mut nav, 0.0, 0.0);

        let value = serde_json::to_value(nav.snapshot()).expect("serializable");
        assert_eq!(
            value,
            json!({
                "currentSection": "hero",
                "scrollDirection": "down",
                "sectionVisibilities": {
                    "hero": 1.0,
                    "skills": 0.0,
                    "somnlogg": 0.0,
                    "qna": 0.0,
                },
                "heroVisibility": 1.0,
            })
        );
    }

    #[test]
    fn scrolling_back_reports_up_direction() {
        let mut nav = navigation();
        scroll_to(&mut nav, 0.0, 1_400.0);
        scroll_to(&mut nav, 200.0, 600.0);

        assert_eq!(nav.snapshot().scroll_direction, ScrollDirection::Up);
        assert_eq!(nav.snapshot().current_section, "skills");
    }

    #[test]
    fn throttled_samples_ask_for_a_retry() {
        let mut nav = navigation();
        scroll_to(&mut nav, 0.0, 0.0);

        let refresh = scroll_to(&mut nav, 30.0, 400.0);
        assert!(!refresh.changed);
        assert_eq!(refresh.retry_in_ms, Some(70.0));
        assert_eq!(nav.snapshot().current_section, "hero");
    }

    #[test]
    fn missing_sections_keep_the_last_highlight() {
        let mut nav = navigation();
        scroll_to(&mut nav, 0.0, 700.0);

        nav.on_sample(500.0, VIEWPORT, &|_| None);
        assert_eq!(nav.snapshot().current_section, "skills");
        assert!(nav.snapshot().section_visibilities.is_empty());
    }
}
