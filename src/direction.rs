use serde::Serialize;

use crate::config::{DEFAULT_DIRECTION_INTERVAL_MS, DEFAULT_DIRECTION_MIN_DELTA_PX};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    #[default]
    Down,
}

impl ScrollDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// Debounced scroll direction.
///
/// Offsets are only recorded once per `min_interval_ms`, and the direction only
/// changes when the distance from the last recorded offset reaches
/// `min_delta_px`. Smaller moves accumulate against the recorded offset.
#[derive(Debug)]
pub struct ScrollDirectionTracker {
    min_delta_px: f64,
    min_interval_ms: f64,
    direction: ScrollDirection,
    recorded_offset: Option<f64>,
    recorded_at: Option<f64>,
}

impl Default for ScrollDirectionTracker {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECTION_MIN_DELTA_PX, DEFAULT_DIRECTION_INTERVAL_MS)
    }
}

impl ScrollDirectionTracker {
    /// Non-finite or negative settings fall back to the defaults.
    pub fn new(min_delta_px: f64, min_interval_ms: f64) -> Self {
        Self {
            min_delta_px: non_negative_or(min_delta_px, DEFAULT_DIRECTION_MIN_DELTA_PX),
            min_interval_ms: non_negative_or(min_interval_ms, DEFAULT_DIRECTION_INTERVAL_MS),
            direction: ScrollDirection::Down,
            recorded_offset: None,
            recorded_at: None,
        }
    }

    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    /// Feeds the current vertical scroll offset. Returns the new direction
    /// when it flipped.
    pub fn observe(&mut self, now_ms: f64, scroll_y: f64) -> Option<ScrollDirection> {
        if !scroll_y.is_finite() {
            return None;
        }

        let Some(recorded) = self.recorded_offset else {
            self.recorded_offset = Some(scroll_y);
            self.recorded_at = Some(now_ms);
            return None;
        };

        if let Some(at) = self.recorded_at {
            let elapsed = now_ms - at;
            if elapsed >= 0.0 && elapsed < self.min_interval_ms {
                return None;
            }
        }

        let delta = scroll_y - recorded;
        if delta.abs() < self.min_delta_px {
            return None;
        }

        self.recorded_offset = Some(scroll_y);
        self.recorded_at = Some(now_ms);

        let next = if delta > 0.0 {
            ScrollDirection::Down
        } else {
            ScrollDirection::Up
        };

        if next == self.direction {
            return None;
        }

        self.direction = next;
        Some(next)
    }
}

fn non_negative_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_scrolling_down() {
        let mut tracker = ScrollDirectionTracker::default();
        assert_eq!(tracker.direction(), ScrollDirection::Down);
        assert_eq!(tracker.observe(0.0, 500.0), None);
        assert_eq!(tracker.direction(), ScrollDirection::Down);
    }

    #[test]
    fn small_moves_accumulate_until_threshold() {
        let mut tracker = ScrollDirectionTracker::default();
        tracker.observe(0.0, 500.0);

        assert_eq!(tracker.observe(200.0, 494.0), None);
        assert_eq!(tracker.observe(400.0, 488.0), None);
        assert_eq!(tracker.direction(), ScrollDirection::Down);

        assert_eq!(tracker.observe(600.0, 484.0), Some(ScrollDirection::Up));
        assert_eq!(tracker.direction(), ScrollDirection::Up);
    }

    #[test]
    fn updates_are_rate_limited() {
        let mut tracker = ScrollDirectionTracker::new(15.0, 100.0);
        tracker.observe(0.0, 500.0);

        assert_eq!(tracker.observe(50.0, 100.0), None);
        assert_eq!(tracker.direction(), ScrollDirection::Down);
        assert_eq!(tracker.observe(120.0, 100.0), Some(ScrollDirection::Up));
    }

    #[test]
    fn momentum_jitter_does_not_oscillate() {
        let mut tracker = ScrollDirectionTracker::default();
        tracker.observe(0.0, 1_000.0);
        tracker.observe(200.0, 900.0);
        assert_eq!(tracker.direction(), ScrollDirection::Up);

        let mut flips = 0;
        for (step, offset) in [905.0, 898.0, 903.0, 896.0, 901.0].into_iter().enumerate() {
            if tracker.observe(400.0 + step as f64 * 200.0, offset).is_some() {
                flips += 1;
            }
        }

        assert_eq!(flips, 0);
    }

    #[test]
    fn non_finite_offsets_are_ignored() {
        let mut tracker = ScrollDirectionTracker::default();
        tracker.observe(0.0, 300.0);
        assert_eq!(tracker.observe(500.0, f64::NAN), None);
        assert_eq!(tracker.observe(700.0, 250.0), Some(ScrollDirection::Up));
    }

    #[test]
    fn invalid_settings_fall_back_to_defaults() {
        for (min_delta_px, min_interval_ms) in [(f64::NAN, 100.0), (-5.0, f64::INFINITY)] {
            let mut tracker = ScrollDirectionTracker::new(min_delta_px, min_interval_ms);
            tracker.observe(0.0, 500.0);

            assert_eq!(tracker.observe(50.0, 400.0), None);
            assert_eq!(tracker.observe(200.0, 495.0), None);
            assert_eq!(tracker.direction(), ScrollDirection::Down);
            assert_eq!(tracker.observe(400.0, 480.0), Some(ScrollDirection::Up));
        }
    }
}
