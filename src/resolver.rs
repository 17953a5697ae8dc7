//! Picks the single current section from live measurements.
//!
//! Every section carries an active latch driven by the direction's
//! [`Band`](crate::thresholds::Band). Selection then goes through the
//! configured [`TieBreak`], falls back to the most visible section above the
//! floor, and finally keeps the previous pick, so there is always exactly one
//! current section.

use serde_json::json;

use crate::config::DEFAULT_VISIBILITY_FLOOR;
use crate::direction::ScrollDirection;
use crate::error::ConfigError;
use crate::logging::{log_event, LogLevel};
use crate::measurement::{clamp_unit, validate_section_ids, Measurements};
use crate::thresholds::{ResolvedThresholds, ThresholdConfig};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TieBreak {
    /// First active section in declaration order.
    DeclarationOrder,
    /// The strictly most visible active section. With nothing active, the
    /// strictly most visible section above `floor`.
    MaxVisibility { floor: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolverSettings {
    pub thresholds: ThresholdConfig,
    pub tie_break: TieBreak,
    pub fallback_floor: f64,
}

impl ResolverSettings {
    pub fn new(thresholds: ThresholdConfig, tie_break: TieBreak) -> Self {
        Self {
            thresholds,
            tie_break,
            fallback_floor: DEFAULT_VISIBILITY_FLOOR,
        }
    }
}

#[derive(Debug)]
pub struct SectionActivityResolver {
    section_ids: Vec<String>,
    thresholds: ResolvedThresholds,
    tie_break: TieBreak,
    fallback_floor: f64,
    active: Vec<bool>,
    current: usize,
}

impl SectionActivityResolver {
    /// The first declared section is current until measurements say otherwise.
    pub fn new(section_ids: Vec<String>, settings: ResolverSettings) -> Result<Self, ConfigError> {
        validate_section_ids(&section_ids)?;
        let thresholds = ResolvedThresholds::resolve(settings.thresholds)?;
        let tie_break = match settings.tie_break {
            TieBreak::MaxVisibility { floor } => TieBreak::MaxVisibility {
                floor: clamp_unit(floor),
            },
            other => other,
        };

        Ok(Self {
            active: vec![false; section_ids.len()],
            section_ids,
            thresholds,
            tie_break,
            fallback_floor: clamp_unit(settings.fallback_floor),
            current: 0,
        })
    }

    pub fn current_section(&self) -> &str {
        &self.section_ids[self.current]
    }

    pub fn is_active(&self, section_id: &str) -> bool {
        self.section_ids
            .iter()
            .position(|id| id == section_id)
            .map(|index| self.active[index])
            .unwrap_or(false)
    }

    /// Folds a measurement snapshot in. Returns the new current section when it changed.
    pub fn update(
        &mut self,
        measurements: &Measurements,
        direction: ScrollDirection,
    ) -> Option<&str> {
        let visibilities: Vec<f64> = self
            .section_ids
            .iter()
            .map(|id| {
                measurements
                    .get(id)
                    .map(|measurement| clamp_unit(measurement.visibility))
                    .unwrap_or(0.0)
            })
            .collect();

        let band = self.thresholds.band(direction);
        for (active, &visibility) in self.active.iter_mut().zip(&visibilities) {
            if *active {
                *active = visibility >= band.exit;
            } else {
                *active = visibility >= band.enter;
            }
        }

        let next = match self.tie_break {
            TieBreak::DeclarationOrder => self
                .active
                .iter()
                .position(|active| *active)
                .or_else(|| most_visible_above(&visibilities, self.fallback_floor)),
            TieBreak::MaxVisibility { floor } => {
                if self.active.iter().any(|active| *active) {
                    strict_max_active(&visibilities, &self.active)
                } else {
                    strict_max_above(&visibilities, floor)
                }
            }
        };

        let next = next.unwrap_or(self.current);
        if next == self.current {
            return None;
        }

        log_event(
            LogLevel::Debug,
            "section_changed",
            json!({
                "from": self.section_ids[self.current],
                "to": self.section_ids[next],
                "direction": direction.as_str(),
                "visibility": visibilities[next],
            }),
        );
        self.current = next;
        Some(self.current_section())
    }
}

/// Most visible index above `floor`; ties go to the earlier section.
fn most_visible_above(visibilities: &[f64], floor: f64) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, &visibility) in visibilities.iter().enumerate() {
        if visibility <= floor {
            continue;
        }
        match best {
            Some(current) if visibilities[current] >= visibility => {}
            _ => best = Some(index),
        }
    }
    best
}

/// Index of the unique maximum if it is above `floor`.
fn strict_max_above(visibilities: &[f64], floor: f64) -> Option<usize> {
    let index = most_visible_above(visibilities, floor)?;
    let max = visibilities[index];
    let tied = visibilities
        .iter()
        .enumerate()
        .any(|(other, &visibility)| other != index && visibility == max);

    if tied {
        None
    } else {
        Some(index)
    }
}

/// Index of the unique maximum among active sections. A tie keeps the
/// previous section.
fn strict_max_active(visibilities: &[f64], active: &[bool]) -> Option<usize> {
    let mut best: Option<usize> = None;
    let mut tied = false;
    for (index, (&visibility, _)) in visibilities
        .iter()
        .zip(active)
        .enumerate()
        .filter(|(_, (_, active))| **active)
    {
        match best {
            Some(current) if visibilities[current] > visibility => {}
            Some(current) if visibilities[current] == visibility => tied = true,
            _ => {
                best = Some(index);
                tied = false;
            }
        }
    }

    if tied {
        None
    } else {
        best
    }
}
