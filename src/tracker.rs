use crate::measurement::{SampleOutcome, SectionRect};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Result of feeding a sample into a tracker.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Refresh {
    /// The tracker's snapshot changed and consumers should re-render.
    pub changed: bool,
    /// Sampling was throttled; ask again after this many milliseconds.
    pub retry_in_ms: Option<f64>,
}

impl Refresh {
    pub const UNCHANGED: Self = Self {
        changed: false,
        retry_in_ms: None,
    };

    pub(crate) fn from_sample(outcome: SampleOutcome) -> Self {
        match outcome {
            SampleOutcome::Published => Self {
                changed: true,
                retry_in_ms: None,
            },
            SampleOutcome::Unchanged => Self::UNCHANGED,
            SampleOutcome::Throttled { retry_in_ms } => Self {
                changed: false,
                retry_in_ms: Some(retry_in_ms),
            },
        }
    }
}

/// The seam between a browser binding and a tracker instance.
///
/// The binding owns listeners and timers and calls into the tracker; the
/// tracker never touches the DOM, so every implementation runs natively
/// under test with scripted timestamps.
pub trait ScrollSubscriber {
    fn section_ids(&self) -> &[String];

    /// Raw scroll offset, fed on every scroll event.
    fn on_scroll(&mut self, now_ms: f64, scroll_y: f64) -> bool;

    /// Re-measure every section.
    fn on_sample(
        &mut self,
        now_ms: f64,
        viewport: Viewport,
        locate: &dyn Fn(&str) -> Option<SectionRect>,
    ) -> Refresh;

    /// The deadline the binding should wake the tracker at, if any.
    fn next_deadline(&self) -> Option<f64> {
        None
    }

    fn on_deadline(&mut self, _now_ms: f64) -> bool {
        false
    }
}
