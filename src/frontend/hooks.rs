use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use yew::prelude::*;

use portfolio_sections::button::{ButtonConfig, HexagonButtonTracker};
use portfolio_sections::detection::{DetectionConfig, DetectionSnapshot, SectionDetection};
use portfolio_sections::error::ConfigError;
use portfolio_sections::hexagon::{ButtonSnapshot, HexagonButtonMachine};
use portfolio_sections::logging::{log_event, LogLevel};
use portfolio_sections::navigation::{NavigationConfig, NavigationSnapshot, SectionNavigation};
use portfolio_sections::tracker::ScrollSubscriber;

use super::browser::ScrollBinding;

/// Builds and attaches a tracker. Any failure is logged and leaves the
/// caller with its last published snapshot.
fn bind<T: ScrollSubscriber + 'static>(
    name: &'static str,
    tracker: Result<T, ConfigError>,
    on_change: impl Fn(&T) + 'static,
) -> Option<ScrollBinding<T>> {
    let tracker = match tracker {
        Ok(tracker) => tracker,
        Err(err) => {
            log_event(
                LogLevel::Info,
                "tracker_config_rejected",
                json!({ "tracker": name, "error": err.to_string() }),
            );
            return None;
        }
    };

    match ScrollBinding::attach(name, tracker, on_change) {
        Ok(binding) => Some(binding),
        Err(err) => {
            log_event(
                LogLevel::Info,
                "tracker_attach_failed",
                json!({ "tracker": name, "error": err.to_string() }),
            );
            None
        }
    }
}

#[hook]
pub fn use_section_navigation(config: NavigationConfig) -> NavigationSnapshot {
    let snapshot = use_state(|| NavigationSnapshot::initial(&config));

    {
        let snapshot = snapshot.clone();
        use_effect_with(config, move |config| {
            let binding = bind("navigation", SectionNavigation::new(config), move |tracker| {
                snapshot.set(tracker.snapshot().clone());
            });
            move || drop(binding)
        });
    }

    (*snapshot).clone()
}

#[hook]
pub fn use_section_detection(config: DetectionConfig) -> Option<DetectionSnapshot> {
    let snapshot = use_state(|| None::<DetectionSnapshot>);

    {
        let snapshot = snapshot.clone();
        use_effect_with(config, move |config| {
            let binding = bind("detection", SectionDetection::new(config), move |tracker| {
                snapshot.set(Some(tracker.snapshot().clone()));
            });
            move || drop(binding)
        });
    }

    (*snapshot).clone()
}

/// The overlay flag is pushed into the live tracker without rebuilding it,
/// so a pending somnlogg confirmation survives toggling the grid.
#[hook]
pub fn use_hexagon_button_state(config: ButtonConfig, show_grid: bool) -> ButtonSnapshot {
    let snapshot = use_state(|| {
        let mut machine = HexagonButtonMachine::new(config.tracking.somnlogg_confirm_ms);
        machine.set_show_grid(show_grid);
        machine.snapshot()
    });
    let binding: Rc<RefCell<Option<ScrollBinding<HexagonButtonTracker>>>> = use_mut_ref(|| None);
    let latest_show_grid = use_mut_ref(|| show_grid);
    *latest_show_grid.borrow_mut() = show_grid;

    {
        let snapshot = snapshot.clone();
        let binding = binding.clone();
        use_effect_with(config, move |config| {
            let tracker = HexagonButtonTracker::new(config.clone()).map(|mut tracker| {
                tracker.set_show_grid(*latest_show_grid.borrow());
                tracker
            });
            *binding.borrow_mut() = bind("hexagon_button", tracker, move |tracker| {
                snapshot.set(tracker.snapshot().clone());
            });
            move || {
                binding.borrow_mut().take();
            }
        });
    }

    {
        let binding = binding.clone();
        use_effect_with(show_grid, move |show_grid| {
            if let Some(binding) = binding.borrow().as_ref() {
                let show_grid = *show_grid;
                binding.update(|tracker| tracker.set_show_grid(show_grid));
            }
            || ()
        });
    }

    (*snapshot).clone()
}
