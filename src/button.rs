use crate::config::TrackingConfig;
use crate::detection::{DetectionConfig, SectionDetection};
use crate::error::ConfigError;
use crate::hexagon::{ButtonSnapshot, HexagonButtonMachine, HexagonInputs, Step};
use crate::measurement::SectionRect;
use crate::tracker::{Refresh, ScrollSubscriber, Viewport};

#[derive(Clone, Debug, PartialEq)]
pub struct ButtonConfig {
    pub hero_section_id: String,
    pub skills_section_id: String,
    pub somnlogg_section_id: String,
    pub tracking: TrackingConfig,
}

impl ButtonConfig {
    pub fn new(tracking: TrackingConfig) -> Self {
        Self {
            hero_section_id: "hero".to_string(),
            skills_section_id: "skills".to_string(),
            somnlogg_section_id: "somnlogg".to_string(),
            tracking,
        }
    }
}

/// Drives the hexagon button machine from live hero/skills/somnlogg detection.
#[derive(Debug)]
pub struct HexagonButtonTracker {
    config: ButtonConfig,
    detection: SectionDetection,
    machine: HexagonButtonMachine,
    is_mobile: bool,
    snapshot: ButtonSnapshot,
}

impl HexagonButtonTracker {
    pub fn new(config: ButtonConfig) -> Result<Self, ConfigError> {
        let detection = SectionDetection::new(&DetectionConfig::new(
            [
                config.hero_section_id.clone(),
                config.skills_section_id.clone(),
                config.somnlogg_section_id.clone(),
            ],
            config.tracking,
        ))?;
        let machine = HexagonButtonMachine::new(config.tracking.somnlogg_confirm_ms);

        Ok(Self {
            snapshot: machine.snapshot(),
            config,
            detection,
            machine,
            is_mobile: false,
        })
    }

    pub fn snapshot(&self) -> &ButtonSnapshot {
        &self.snapshot
    }

    pub fn set_show_grid(&mut self, show_grid: bool) -> bool {
        self.machine.set_show_grid(show_grid);
        self.refresh_snapshot()
    }

    fn inputs(&self) -> HexagonInputs {
        HexagonInputs {
            hero_visibility: self.detection.visibility(&self.config.hero_section_id),
            skills_visibility: self.detection.visibility(&self.config.skills_section_id),
            somnlogg_visibility: self.detection.visibility(&self.config.somnlogg_section_id),
            scroll_direction: self.detection.direction(),
            is_mobile: self.is_mobile,
        }
    }

    fn feed(&mut self, now_ms: f64) -> bool {
        let inputs = self.inputs();
        self.machine.update(now_ms, inputs);
        self.refresh_snapshot()
    }

    fn refresh_snapshot(&mut self) -> bool {
        let next = self.machine.snapshot();
        if next == self.snapshot {
            return false;
        }
        self.snapshot = next;
        true
    }
}

impl ScrollSubscriber for HexagonButtonTracker {
    fn section_ids(&self) -> &[String] {
        self.detection.section_ids()
    }

    fn on_scroll(&mut self, now_ms: f64, scroll_y: f64) -> bool {
        if !self.detection.on_scroll(now_ms, scroll_y) {
            return false;
        }
        self.feed(now_ms)
    }

    fn on_sample(
        &mut self,
        now_ms: f64,
        viewport: Viewport,
        locate: &dyn Fn(&str) -> Option<SectionRect>,
    ) -> Refresh {
        let is_mobile = viewport.width > 0.0 && viewport.width < self.config.tracking.mobile_breakpoint_px;
        let layout_changed = is_mobile != self.is_mobile;
        self.is_mobile = is_mobile;

        let refresh = self.detection.on_sample(now_ms, viewport, locate);
        if !refresh.changed && !layout_changed {
            return refresh;
        }
        Refresh {
            changed: self.feed(now_ms),
            ..refresh
        }
    }

    fn next_deadline(&self) -> Option<f64> {
        self.machine.next_deadline()
    }

    fn on_deadline(&mut self, now_ms: f64) -> bool {
        if self.machine.expire(now_ms) == Step::Unchanged {
            return false;
        }
        self.refresh_snapshot()
    }
}
