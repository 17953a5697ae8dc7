//! Per-section visibility sampling.
//!
//! The sampler turns bounding rectangles into [`SectionMeasurement`]s and only
//! publishes a new map when something moved past the deadband, so sub-pixel
//! jitter does not cause re-renders.

use std::collections::{BTreeMap, HashSet};

use crate::config::{DEFAULT_SAMPLE_INTERVAL_MS, DEFAULT_VISIBILITY_DEADBAND};
use crate::error::ConfigError;

pub type Measurements = BTreeMap<String, SectionMeasurement>;

/// Viewport-space rectangle of a section, as reported by `getBoundingClientRect`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectionRect {
    pub top: f64,
    pub bottom: f64,
}

impl SectionRect {
    pub fn new(top: f64, bottom: f64) -> Self {
        Self { top, bottom }
    }
}

/// What the visible span is divided by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisibilityMode {
    /// Fraction of the section's own height that is on screen.
    SectionRelative,
    /// Fraction of the viewport height the section occupies.
    ViewportRelative,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SectionMeasurement {
    pub section_id: String,
    pub visibility: f64,
    pub is_in_viewport: bool,
    pub top_offset: f64,
    pub bottom_offset: f64,
    pub section_height: f64,
    pub visible_height: f64,
}

/// Clamps to `[0, 1]`, mapping `NaN` to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if !denominator.is_finite() || denominator <= 0.0 {
        return 0.0;
    }
    clamp_unit(numerator / denominator)
}

pub fn measure(
    section_id: &str,
    rect: SectionRect,
    viewport_height: f64,
    mode: VisibilityMode,
) -> SectionMeasurement {
    let viewport_height = finite_or_zero(viewport_height).max(0.0);
    let top = finite_or_zero(rect.top);
    let bottom = finite_or_zero(rect.bottom).max(top);

    let section_height = bottom - top;
    let visible_height = (bottom.min(viewport_height) - top.max(0.0)).max(0.0);
    let reference_height = match mode {
        VisibilityMode::SectionRelative => section_height,
        VisibilityMode::ViewportRelative => viewport_height,
    };

    SectionMeasurement {
        section_id: section_id.to_string(),
        visibility: ratio(visible_height, reference_height),
        is_in_viewport: visible_height > 0.0,
        top_offset: top,
        bottom_offset: bottom - viewport_height,
        section_height,
        visible_height,
    }
}

pub(crate) fn validate_section_ids(section_ids: &[String]) -> Result<(), ConfigError> {
    if section_ids.is_empty() {
        return Err(ConfigError::NoSections);
    }

    let mut seen = HashSet::new();
    for id in section_ids {
        if id.trim().is_empty() {
            return Err(ConfigError::EmptySectionId);
        }
        if !seen.insert(id.as_str()) {
            return Err(ConfigError::DuplicateSection(id.clone()));
        }
    }

    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerSettings {
    pub mode: VisibilityMode,
    pub min_interval_ms: f64,
    pub deadband: f64,
}

impl SamplerSettings {
    pub fn new(mode: VisibilityMode) -> Self {
        Self {
            mode,
            min_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            deadband: DEFAULT_VISIBILITY_DEADBAND,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SampleOutcome {
    /// A new measurement map is available through [`VisibilitySampler::measurements`].
    Published,
    Unchanged,
    /// Too soon after the previous sample. The host should try again later.
    Throttled { retry_in_ms: f64 },
}

#[derive(Debug)]
pub struct VisibilitySampler {
    section_ids: Vec<String>,
    settings: SamplerSettings,
    published: Measurements,
    last_sample_at: Option<f64>,
}

impl VisibilitySampler {
    pub fn new(section_ids: Vec<String>, settings: SamplerSettings) -> Result<Self, ConfigError> {
        validate_section_ids(&section_ids)?;

        Ok(Self {
            section_ids,
            settings,
            published: Measurements::new(),
            last_sample_at: None,
        })
    }

    pub fn section_ids(&self) -> &[String] {
        &self.section_ids
    }

    pub fn mode(&self) -> VisibilityMode {
        self.settings.mode
    }

    pub fn measurements(&self) -> &Measurements {
        &self.published
    }

    /// Visibility of a section, 0 when it has never been measured.
    pub fn visibility(&self, section_id: &str) -> f64 {
        self.published
            .get(section_id)
            .map(|measurement| measurement.visibility)
            .unwrap_or(0.0)
    }

    pub fn sample(
        &mut self,
        now_ms: f64,
        viewport_height: f64,
        locate: impl Fn(&str) -> Option<SectionRect>,
    ) -> SampleOutcome {
        if let Some(last) = self.last_sample_at {
            let elapsed = now_ms - last;
            if elapsed >= 0.0 && elapsed < self.settings.min_interval_ms {
                return SampleOutcome::Throttled {
                    retry_in_ms: self.settings.min_interval_ms - elapsed,
                };
            }
        }
        self.last_sample_at = Some(now_ms);

        let next: Measurements = self
            .section_ids
            .iter()
            .filter_map(|id| {
                let rect = locate(id)?;
                Some((
                    id.clone(),
                    measure(id, rect, viewport_height, self.settings.mode),
                ))
            })
            .collect();

        if !differs(&self.published, &next, self.settings.deadband) {
            return SampleOutcome::Unchanged;
        }

        self.published = next;
        SampleOutcome::Published
    }
}

fn differs(previous: &Measurements, next: &Measurements, deadband: f64) -> bool {
    if previous.len() != next.len() {
        return true;
    }

    next.iter().any(|(id, measurement)| match previous.get(id) {
        None => true,
        Some(prior) => {
            (prior.visibility - measurement.visibility).abs() > deadband
                || prior.is_in_viewport != measurement.is_in_viewport
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const VIEWPORT: f64 = 800.0;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn sampler(mode: VisibilityMode) -> VisibilitySampler {
        VisibilitySampler::new(ids(&["hero", "skills"]), SamplerSettings::new(mode))
            .expect("valid ids")
    }

    fn page(rects: &[(&str, f64, f64)]) -> HashMap<String, SectionRect> {
        rects
            .iter()
            .map(|(id, top, bottom)| (id.to_string(), SectionRect::new(*top, *bottom)))
            .collect()
    }

    #[test]
    fn section_relative_visibility_uses_own_height() {
        let measurement = measure(
            "hero",
            SectionRect::new(-200.0, 600.0),
            VIEWPORT,
            VisibilityMode::SectionRelative,
        );

        assert_eq!(measurement.section_height, 800.0);
        assert_eq!(measurement.visible_height, 600.0);
        assert_eq!(measurement.visibility, 0.75);
        assert!(measurement.is_in_viewport);
        assert_eq!(measurement.bottom_offset, -200.0);
    }

    #[test]
    fn viewport_relative_visibility_uses_viewport_height() {
        let measurement = measure(
            "skills",
            SectionRect::new(400.0, 2_000.0),
            VIEWPORT,
            VisibilityMode::ViewportRelative,
        );

        assert_eq!(measurement.visible_height, 400.0);
        assert_eq!(measurement.visibility, 0.5);
    }

    #[test]
    fn visibility_is_clamped_for_degenerate_rects() {
        let cases = [
            SectionRect::new(900.0, 1_500.0),
            SectionRect::new(-900.0, -100.0),
            SectionRect::new(300.0, 300.0),
            SectionRect::new(500.0, 100.0),
            SectionRect::new(f64::NAN, f64::INFINITY),
        ];

        for mode in [VisibilityMode::SectionRelative, VisibilityMode::ViewportRelative] {
            for rect in cases {
                let measurement = measure("qna", rect, VIEWPORT, mode);
                assert!(
                    (0.0..=1.0).contains(&measurement.visibility),
                    "{rect:?} produced {}",
                    measurement.visibility
                );
            }
        }

        let zero_height = measure(
            "qna",
            SectionRect::new(300.0, 300.0),
            VIEWPORT,
            VisibilityMode::SectionRelative,
        );
        assert_eq!(zero_height.visibility, 0.0);
        assert!(!zero_height.is_in_viewport);

        let no_viewport = measure(
            "qna",
            SectionRect::new(0.0, 300.0),
            0.0,
            VisibilityMode::ViewportRelative,
        );
        assert_eq!(no_viewport.visibility, 0.0);
    }

    #[test]
    fn missing_anchor_is_omitted() {
        let mut sampler = sampler(VisibilityMode::SectionRelative);
        let rects = page(&[("hero", 0.0, 800.0)]);

        let outcome = sampler.sample(0.0, VIEWPORT, |id| rects.get(id).copied());

        assert_eq!(outcome, SampleOutcome::Published);
        assert!(sampler.measurements().contains_key("hero"));
        assert!(!sampler.measurements().contains_key("skills"));
        assert_eq!(sampler.visibility("skills"), 0.0);
    }

    #[test]
    fn samples_inside_interval_are_throttled() {
        let mut sampler = sampler(VisibilityMode::SectionRelative);
        let rects = page(&[("hero", 0.0, 800.0), ("skills", 800.0, 1_600.0)]);

        sampler.sample(1_000.0, VIEWPORT, |id| rects.get(id).copied());
        let outcome = sampler.sample(1_040.0, VIEWPORT, |id| rects.get(id).copied());

        assert_eq!(outcome, SampleOutcome::Throttled { retry_in_ms: 60.0 });
    }

    #[test]
    fn jitter_inside_deadband_is_not_published() {
        let mut sampler = sampler(VisibilityMode::SectionRelative);
        let first = page(&[("hero", 0.0, 800.0), ("skills", 850.0, 1_650.0)]);
        let jitter = page(&[("hero", -4.0, 796.0), ("skills", 846.0, 1_646.0)]);
        let scrolled = page(&[("hero", -200.0, 600.0), ("skills", 600.0, 1_400.0)]);

        assert_eq!(
            sampler.sample(0.0, VIEWPORT, |id| first.get(id).copied()),
            SampleOutcome::Published
        );
        assert_eq!(
            sampler.sample(200.0, VIEWPORT, |id| jitter.get(id).copied()),
            SampleOutcome::Unchanged
        );
        assert_eq!(sampler.visibility("hero"), 1.0);
        assert_eq!(
            sampler.sample(400.0, VIEWPORT, |id| scrolled.get(id).copied()),
            SampleOutcome::Published
        );
        assert_eq!(sampler.visibility("skills"), 0.25);
    }

    #[test]
    fn viewport_flip_publishes_even_inside_deadband() {
        let mut sampler = VisibilitySampler::new(
            ids(&["hero", "skills"]),
            SamplerSettings {
                deadband: 0.05,
                ..SamplerSettings::new(VisibilityMode::SectionRelative)
            },
        )
        .expect("valid ids");
        let below = page(&[("hero", 0.0, 800.0), ("skills", 800.0, 1_600.0)]);
        let peeking = page(&[("hero", -1.0, 799.0), ("skills", 799.0, 1_599.0)]);

        sampler.sample(0.0, VIEWPORT, |id| below.get(id).copied());
        let outcome = sampler.sample(500.0, VIEWPORT, |id| peeking.get(id).copied());

        assert_eq!(outcome, SampleOutcome::Published);
        assert!(sampler.measurements()["skills"].is_in_viewport);
    }

    #[test]
    fn construction_rejects_bad_id_lists() {
        let settings = SamplerSettings::new(VisibilityMode::SectionRelative);

        assert_eq!(
            VisibilitySampler::new(Vec::new(), settings).err(),
            Some(ConfigError::NoSections)
        );
        assert_eq!(
            VisibilitySampler::new(ids(&["hero", "hero"]), settings).err(),
            Some(ConfigError::DuplicateSection("hero".to_string()))
        );
        assert_eq!(
            VisibilitySampler::new(ids(&["hero", " "]), settings).err(),
            Some(ConfigError::EmptySectionId)
        );
    }
}
