//! Floating hexagon button state.
//!
//! The machine keeps a confirmed [`HexagonState`] plus at most one pending
//! transition. Moves towards `Somnlogg` wait for the confirmation window and
//! are re-checked when it expires; every other move commits immediately.

use serde::Serialize;
use serde_json::json;

use crate::config::DEFAULT_SOMNLOGG_CONFIRM_MS;
use crate::direction::ScrollDirection;
use crate::logging::{log_event, LogLevel};
use crate::measurement::clamp_unit;

const HERO_DOMINANT: f64 = 0.80;
const HERO_LEADING: f64 = 0.75;
const SKILLS_RECEDED: f64 = 0.35;
const SOMNLOGG_ENTER_DOWN: f64 = 0.75;
const SOMNLOGG_RELEASE: f64 = 0.15;
const SKILLS_RECLAIM_UP: f64 = 0.08;
const SOMNLOGG_HOLD_UP: f64 = 0.09;
const SOMNLOGG_ENTER_UP: f64 = 0.15;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HexagonState {
    Hero,
    Other,
    Somnlogg,
}

impl HexagonState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Other => "other",
            Self::Somnlogg => "somnlogg",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PositionMode {
    HeroCenter,
    StickyLeft,
}

impl PositionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HeroCenter => "hero-center",
            Self::StickyLeft => "sticky-left",
        }
    }
}

impl From<HexagonState> for PositionMode {
    fn from(state: HexagonState) -> Self {
        match state {
            HexagonState::Hero => Self::HeroCenter,
            HexagonState::Other | HexagonState::Somnlogg => Self::StickyLeft,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HexagonInputs {
    pub hero_visibility: f64,
    pub skills_visibility: f64,
    pub somnlogg_visibility: f64,
    pub scroll_direction: ScrollDirection,
    pub is_mobile: bool,
}

impl HexagonInputs {
    fn sanitized(self) -> Self {
        Self {
            hero_visibility: clamp_unit(self.hero_visibility),
            skills_visibility: clamp_unit(self.skills_visibility),
            somnlogg_visibility: clamp_unit(self.somnlogg_visibility),
            ..self
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransition {
    pub target: HexagonState,
    pub started_at_ms: f64,
}

/// What a single update did to the machine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    Unchanged,
    Committed { from: HexagonState, to: HexagonState },
    PendingStarted { target: HexagonState, due_at_ms: f64 },
    PendingCancelled,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonDebugInfo {
    pub target_state: HexagonState,
    pub pending: Option<PendingTransition>,
    pub somnlogg_latched: bool,
    pub inputs: HexagonInputs,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonSnapshot {
    pub button_state: HexagonState,
    pub position_mode: PositionMode,
    pub should_be_visible: bool,
    pub opacity: f64,
    pub debug_info: ButtonDebugInfo,
}

#[derive(Debug)]
pub struct HexagonButtonMachine {
    confirm_delay_ms: f64,
    confirmed: HexagonState,
    pending: Option<PendingTransition>,
    target: HexagonState,
    somnlogg_latched: bool,
    inputs: HexagonInputs,
    show_grid: bool,
}

impl Default for HexagonButtonMachine {
    fn default() -> Self {
        Self::new(DEFAULT_SOMNLOGG_CONFIRM_MS)
    }
}

impl HexagonButtonMachine {
    pub fn new(confirm_delay_ms: f64) -> Self {
        let confirm_delay_ms = if confirm_delay_ms.is_finite() {
            confirm_delay_ms.max(0.0)
        } else {
            DEFAULT_SOMNLOGG_CONFIRM_MS
        };

        Self {
            confirm_delay_ms,
            confirmed: HexagonState::Hero,
            pending: None,
            target: HexagonState::Hero,
            somnlogg_latched: false,
            inputs: HexagonInputs::default(),
            show_grid: false,
        }
    }

    pub fn state(&self) -> HexagonState {
        self.confirmed
    }

    pub fn position_mode(&self) -> PositionMode {
        self.confirmed.into()
    }

    pub fn pending(&self) -> Option<PendingTransition> {
        self.pending
    }

    /// When the pending transition should be re-checked, if one is in flight.
    pub fn next_deadline(&self) -> Option<f64> {
        self.pending
            .map(|pending| pending.started_at_ms + self.confirm_delay_ms)
    }

    pub fn set_show_grid(&mut self, show_grid: bool) {
        self.show_grid = show_grid;
    }

    pub fn opacity(&self) -> f64 {
        if self.show_grid {
            0.0
        } else {
            1.0
        }
    }

    pub fn snapshot(&self) -> ButtonSnapshot {
        ButtonSnapshot {
            button_state: self.confirmed,
            position_mode: self.position_mode(),
            should_be_visible: !self.show_grid,
            opacity: self.opacity(),
            debug_info: ButtonDebugInfo {
                target_state: self.target,
                pending: self.pending,
                somnlogg_latched: self.somnlogg_latched,
                inputs: self.inputs,
            },
        }
    }

    pub fn update(&mut self, now_ms: f64, inputs: HexagonInputs) -> Step {
        self.inputs = inputs.sanitized();
        self.target = self.evaluate_target();
        self.apply(now_ms, self.target)
    }

    /// Called when the confirmation timer fires. Commits the pending state
    /// only if it is still the live target.
    pub fn expire(&mut self, now_ms: f64) -> Step {
        let Some(pending) = self.pending else {
            return Step::Unchanged;
        };
        if now_ms < pending.started_at_ms + self.confirm_delay_ms {
            return Step::Unchanged;
        }

        self.pending = None;
        self.target = self.evaluate_target();

        if self.target == pending.target {
            return self.commit(pending.target);
        }

        log_event(
            LogLevel::Debug,
            "hexagon_pending_cancelled",
            json!({ "target": pending.target.as_str(), "reason": "expired_stale" }),
        );
        match self.apply(now_ms, self.target) {
            Step::Unchanged => Step::PendingCancelled,
            other => other,
        }
    }

    fn apply(&mut self, now_ms: f64, target: HexagonState) -> Step {
        if target == self.confirmed {
            return match self.pending.take() {
                Some(pending) => {
                    log_event(
                        LogLevel::Debug,
                        "hexagon_pending_cancelled",
                        json!({ "target": pending.target.as_str(), "reason": "target_reverted" }),
                    );
                    Step::PendingCancelled
                }
                None => Step::Unchanged,
            };
        }

        if target != HexagonState::Somnlogg || self.confirm_delay_ms <= 0.0 {
            self.pending = None;
            return self.commit(target);
        }

        if matches!(self.pending, Some(pending) if pending.target == target) {
            return Step::Unchanged;
        }

        self.pending = Some(PendingTransition {
            target,
            started_at_ms: now_ms,
        });
        let due_at_ms = now_ms + self.confirm_delay_ms;
        log_event(
            LogLevel::Debug,
            "hexagon_pending_started",
            json!({ "target": target.as_str(), "dueAtMs": due_at_ms }),
        );
        Step::PendingStarted { target, due_at_ms }
    }

    fn commit(&mut self, to: HexagonState) -> Step {
        let from = self.confirmed;
        self.confirmed = to;
        if to == HexagonState::Somnlogg {
            self.somnlogg_latched = true;
        }

        log_event(
            LogLevel::Info,
            "hexagon_transition",
            json!({
                "from": from.as_str(),
                "to": to.as_str(),
                "positionMode": self.position_mode().as_str(),
                "debugInfo": self.snapshot().debug_info,
            }),
        );
        Step::Committed { from, to }
    }

    fn evaluate_target(&mut self) -> HexagonState {
        let inputs = self.inputs;

        if inputs.hero_visibility > HERO_DOMINANT {
            return HexagonState::Hero;
        }
        if inputs.hero_visibility > HERO_LEADING && inputs.skills_visibility < SKILLS_RECEDED {
            return HexagonState::Hero;
        }
        if !inputs.is_mobile {
            return HexagonState::Other;
        }

        let somnlogg = inputs.somnlogg_visibility;
        match inputs.scroll_direction {
            ScrollDirection::Down => {
                if self.somnlogg_latched {
                    if somnlogg >= SOMNLOGG_RELEASE {
                        return HexagonState::Somnlogg;
                    }
                    self.somnlogg_latched = false;
                } else if somnlogg >= SOMNLOGG_ENTER_DOWN {
                    return HexagonState::Somnlogg;
                }
            }
            ScrollDirection::Up => {
                if inputs.skills_visibility > SKILLS_RECLAIM_UP {
                    self.somnlogg_latched = false;
                    return HexagonState::Other;
                }
                if self.somnlogg_latched && somnlogg >= SOMNLOGG_HOLD_UP {
                    return HexagonState::Somnlogg;
                }
                if somnlogg >= SOMNLOGG_ENTER_UP {
                    self.somnlogg_latched = true;
                    return HexagonState::Somnlogg;
                }
                if somnlogg < SOMNLOGG_HOLD_UP {
                    self.somnlogg_latched = false;
                }
            }
        }

        HexagonState::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mobile(direction: ScrollDirection, hero: f64, skills: f64, somnlogg: f64) -> HexagonInputs {
        HexagonInputs {
            hero_visibility: hero,
            skills_visibility: skills,
            somnlogg_visibility: somnlogg,
            scroll_direction: direction,
            is_mobile: true,
        }
    }

    fn down(somnlogg: f64) -> HexagonInputs {
        mobile(ScrollDirection::Down, 0.0, 0.0, somnlogg)
    }

    fn machine_in_other() -> HexagonButtonMachine {
        let mut machine = HexagonButtonMachine::default();
        machine.update(0.0, down(0.5));
        assert_eq!(machine.state(), HexagonState::Other);
        machine
    }

    fn machine_in_somnlogg() -> HexagonButtonMachine {
        let mut machine = machine_in_other();
        machine.update(100.0, down(0.8));
        machine.expire(2_600.0);
        assert_eq!(machine.state(), HexagonState::Somnlogg);
        machine
    }

    #[test]
    fn hero_dominant_centers_the_button() {
        let mut machine = HexagonButtonMachine::default();
        let step = machine.update(
            0.0,
            HexagonInputs {
                hero_visibility: 0.9,
                skills_visibility: 0.1,
                ..HexagonInputs::default()
            },
        );

        assert_eq!(step, Step::Unchanged);
        let snapshot = machine.snapshot();
        assert_eq!(snapshot.button_state, HexagonState::Hero);
        assert_eq!(snapshot.debug_info.target_state, HexagonState::Hero);
        assert_eq!(snapshot.position_mode, PositionMode::HeroCenter);
    }

    #[test]
    fn hero_leading_needs_receded_skills() {
        let mut machine = machine_in_other();

        machine.update(10.0, mobile(ScrollDirection::Up, 0.78, 0.4, 0.0));
        assert_eq!(machine.state(), HexagonState::Other);

        machine.update(20.0, mobile(ScrollDirection::Up, 0.78, 0.3, 0.0));
        assert_eq!(machine.state(), HexagonState::Hero);
    }

    #[test]
    fn somnlogg_commits_only_after_confirmation_window() {
        let mut machine = machine_in_other();

        let step = machine.update(100.0, down(0.8));
        assert_eq!(
            step,
            Step::PendingStarted {
                target: HexagonState::Somnlogg,
                due_at_ms: 2_600.0
            }
        );

        let mut now = 100.0;
        while now < 2_600.0 {
            machine.update(now, down(0.8));
            machine.expire(now);
            assert_eq!(machine.state(), HexagonState::Other, "committed early at {now}");
            now += 100.0;
        }

        let step = machine.expire(2_600.0);
        assert_eq!(
            step,
            Step::Committed {
                from: HexagonState::Other,
                to: HexagonState::Somnlogg
            }
        );
        assert_eq!(machine.position_mode(), PositionMode::StickyLeft);
        assert_eq!(machine.next_deadline(), None);
    }

    #[test]
    fn reverting_target_cancels_pending_somnlogg() {
        let mut machine = machine_in_other();
        machine.update(100.0, down(0.8));

        let step = machine.update(1_600.0, down(0.2));
        assert_eq!(step, Step::PendingCancelled);
        assert_eq!(machine.pending(), None);
        assert_eq!(machine.next_deadline(), None);

        assert_eq!(machine.expire(2_600.0), Step::Unchanged);
        assert_eq!(machine.expire(3_100.0), Step::Unchanged);
        assert_eq!(machine.state(), HexagonState::Other);
    }

    #[test]
    fn repeated_input_does_not_restart_timer() {
        let mut machine = machine_in_other();
        machine.update(100.0, down(0.8));
        let deadline = machine.next_deadline();

        assert_eq!(machine.update(900.0, down(0.8)), Step::Unchanged);
        assert_eq!(machine.update(900.0, down(0.8)), Step::Unchanged);
        assert_eq!(machine.next_deadline(), deadline);
    }

    #[test]
    fn stale_expiry_is_discarded() {
        let mut machine = machine_in_other();
        machine.update(100.0, down(0.8));
        machine.inputs = down(0.3);

        assert_eq!(machine.expire(2_600.0), Step::PendingCancelled);
        assert_eq!(machine.state(), HexagonState::Other);
    }

    #[test]
    fn instant_transitions_commit_in_the_same_update() {
        let mut machine = HexagonButtonMachine::default();

        assert_eq!(
            machine.update(0.0, down(0.0)),
            Step::Committed {
                from: HexagonState::Hero,
                to: HexagonState::Other
            }
        );
        assert_eq!(
            machine.update(10.0, mobile(ScrollDirection::Up, 0.9, 0.0, 0.0)),
            Step::Committed {
                from: HexagonState::Other,
                to: HexagonState::Hero
            }
        );

        let mut machine = machine_in_somnlogg();
        assert_eq!(
            machine.update(3_000.0, mobile(ScrollDirection::Up, 0.0, 0.2, 0.5)),
            Step::Committed {
                from: HexagonState::Somnlogg,
                to: HexagonState::Other
            }
        );

        let mut machine = machine_in_somnlogg();
        assert_eq!(
            machine.update(3_000.0, mobile(ScrollDirection::Down, 0.9, 0.0, 0.0)),
            Step::Committed {
                from: HexagonState::Somnlogg,
                to: HexagonState::Hero
            }
        );
        assert_eq!(machine.position_mode(), PositionMode::HeroCenter);
        assert_eq!(machine.pending(), None);
    }

    #[test]
    fn latch_holds_somnlogg_until_release_while_scrolling_down() {
        let mut machine = machine_in_somnlogg();

        machine.update(3_000.0, down(0.2));
        assert_eq!(machine.state(), HexagonState::Somnlogg);

        machine.update(3_100.0, down(0.1));
        assert_eq!(machine.state(), HexagonState::Other);
        assert!(!machine.snapshot().debug_info.somnlogg_latched);
    }

    #[test]
    fn scrolling_up_uses_looser_somnlogg_bands() {
        let mut machine = machine_in_other();

        let step = machine.update(100.0, mobile(ScrollDirection::Up, 0.0, 0.0, 0.16));
        assert!(matches!(step, Step::PendingStarted { .. }));
        assert!(machine.snapshot().debug_info.somnlogg_latched);

        machine.update(500.0, mobile(ScrollDirection::Up, 0.0, 0.0, 0.1));
        assert!(machine.pending().is_some());

        machine.update(900.0, mobile(ScrollDirection::Up, 0.0, 0.05, 0.08));
        assert_eq!(machine.pending(), None);
        assert!(!machine.snapshot().debug_info.somnlogg_latched);
    }

    #[test]
    fn desktop_never_targets_somnlogg() {
        let mut machine = HexagonButtonMachine::default();
        let inputs = HexagonInputs {
            somnlogg_visibility: 1.0,
            ..HexagonInputs::default()
        };

        machine.update(0.0, inputs);
        machine.update(5_000.0, inputs);
        assert_eq!(machine.state(), HexagonState::Other);
        assert_eq!(machine.pending(), None);
    }

    #[test]
    fn grid_overlay_only_touches_opacity() {
        let mut machine = machine_in_other();

        machine.set_show_grid(true);
        let hidden = machine.snapshot();
        assert_eq!(hidden.opacity, 0.0);
        assert!(!hidden.should_be_visible);
        assert_eq!(hidden.button_state, HexagonState::Other);

        machine.set_show_grid(false);
        let shown = machine.snapshot();
        assert_eq!(shown.opacity, 1.0);
        assert_eq!(shown.button_state, HexagonState::Other);
    }

    #[test]
    fn snapshot_serializes_with_consumer_field_names() {
        let initial = serde_json::to_value(HexagonButtonMachine::default().snapshot())
            .expect("serializable");
        assert_eq!(initial["buttonState"], "hero");
        assert_eq!(initial["positionMode"], "hero-center");

        let mut machine = machine_in_other();
        machine.update(100.0, down(0.8));
        let pending = serde_json::to_value(machine.snapshot()).expect("serializable");
        assert_eq!(
            pending["debugInfo"]["pending"],
            json!({ "target": "somnlogg", "startedAtMs": 100.0 })
        );

        machine.expire(2_600.0);
        let value = serde_json::to_value(machine.snapshot()).expect("serializable");
        assert_eq!(
            value,
            json!({
                "buttonState": "somnlogg",
                "positionMode": "sticky-left",
                "shouldBeVisible": true,
                "opacity": 1.0,
                "debugInfo": {
                    "targetState": "somnlogg",
                    "pending": null,
                    "somnloggLatched": true,
                    "inputs": {
                        "heroVisibility": 0.0,
                        "skillsVisibility": 0.0,
                        "somnloggVisibility": 0.8,
                        "scrollDirection": "down",
                        "isMobile": true,
                    },
                },
            })
        );
    }

    #[test]
    fn nan_inputs_are_treated_as_hidden() {
        let mut machine = HexagonButtonMachine::default();
        machine.update(
            0.0,
            HexagonInputs {
                hero_visibility: f64::NAN,
                ..HexagonInputs::default()
            },
        );

        assert_eq!(machine.state(), HexagonState::Other);
        assert_eq!(machine.snapshot().debug_info.inputs.hero_visibility, 0.0);
    }
}
