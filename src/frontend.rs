mod browser;
mod context;
mod hooks;

use serde_json::json;
use web_sys::{window, Element, MouseEvent, ScrollBehavior, ScrollIntoViewOptions};
use yew::prelude::*;

use portfolio_sections::button::ButtonConfig;
use portfolio_sections::config::TrackingConfig;
use portfolio_sections::detection::DetectionConfig;
use portfolio_sections::hexagon::ButtonSnapshot;
use portfolio_sections::logging::{log_event, set_min_level, LogLevel};
use portfolio_sections::navigation::NavigationConfig;
use portfolio_sections::preferences::Locale;

use context::{use_preferences, PreferencesProvider};
use hooks::{use_hexagon_button_state, use_section_detection, use_section_navigation};

const MOUNT_ID: &str = "app";
const SECTION_IDS: [&str; 5] = ["hero", "skills", "somnlogg", "education", "qna"];

struct SectionCopy {
    id: &'static str,
    nav_label: &'static str,
    heading: &'static str,
    body: &'static str,
}

fn section_copy(locale: Locale) -> [SectionCopy; 5] {
    match locale {
        Locale::En => [
            SectionCopy {
                id: "hero",
                nav_label: "Home",
                heading: "Designer and developer",
                body: "Interfaces that respond to where you are on the page.",
            },
            SectionCopy {
                id: "skills",
                nav_label: "Skills",
                heading: "Skills",
                body: "Product design, prototyping, frontend engineering and motion.",
            },
            SectionCopy {
                id: "somnlogg",
                nav_label: "Somnlogg",
                heading: "Somnlogg",
                body: "A sleep diary that turns nightly notes into readable patterns.",
            },
            SectionCopy {
                id: "education",
                nav_label: "Education",
                heading: "Education",
                body: "Interaction design and computer science.",
            },
            SectionCopy {
                id: "qna",
                nav_label: "Q&A",
                heading: "Questions and answers",
                body: "Ask about process, tools or collaboration.",
            },
        ],
        Locale::Sv => [
            SectionCopy {
                id: "hero",
                nav_label: "Hem",
                heading: "Designer och utvecklare",
                body: "Gränssnitt som följer var du befinner dig på sidan.",
            },
            SectionCopy {
                id: "skills",
                nav_label: "Kompetens",
                heading: "Kompetens",
                body: "Produktdesign, prototyper, frontendutveckling och rörelse.",
            },
            SectionCopy {
                id: "somnlogg",
                nav_label: "Somnlogg",
                heading: "Somnlogg",
                body: "En sömndagbok som gör nattliga anteckningar till läsbara mönster.",
            },
            SectionCopy {
                id: "education",
                nav_label: "Utbildning",
                heading: "Utbildning",
                body: "Interaktionsdesign och datavetenskap.",
            },
            SectionCopy {
                id: "qna",
                nav_label: "Frågor",
                heading: "Frågor och svar",
                body: "Fråga om process, verktyg eller samarbete.",
            },
        ],
    }
}

fn grid_toggle_label(locale: Locale, show_grid: bool) -> &'static str {
    match (locale, show_grid) {
        (Locale::En, false) => "Show grid",
        (Locale::En, true) => "Hide grid",
        (Locale::Sv, false) => "Visa rutnät",
        (Locale::Sv, true) => "Dölj rutnät",
    }
}

fn mount_element() -> Option<Element> {
    window()?.document()?.get_element_by_id(MOUNT_ID)
}

/// Reads `data-sample-interval-ms` and friends off the mount element.
fn tracking_from_mount(mount: &Element) -> TrackingConfig {
    TrackingConfig::from_lookup(|key| mount.get_attribute(&TrackingConfig::data_attribute_name(key)))
}

fn scroll_to_section(section_id: &str) {
    let Some(element) = window()
        .and_then(|w| w.document())
        .and_then(|document| document.get_element_by_id(section_id))
    else {
        return;
    };

    let options = ScrollIntoViewOptions::new();
    options.set_behavior(ScrollBehavior::Smooth);
    element.scroll_into_view_with_scroll_into_view_options(&options);
}

fn hexagon_style(snapshot: &ButtonSnapshot) -> String {
    format!(
        "opacity: {:.2}; pointer-events: {};",
        snapshot.opacity,
        if snapshot.should_be_visible { "auto" } else { "none" }
    )
}

#[derive(Properties, PartialEq)]
struct NavLinkProps {
    section_id: AttrValue,
    label: AttrValue,
    current: bool,
}

#[function_component(NavLink)]
fn nav_link(props: &NavLinkProps) -> Html {
    let onclick = {
        let section_id = props.section_id.clone();
        Callback::from(move |event: MouseEvent| {
            event.prevent_default();
            scroll_to_section(&section_id);
        })
    };

    html! {
        <a
            class={classes!("nav-link", props.current.then_some("is-current"))}
            href={format!("#{}", props.section_id)}
            aria-current={props.current.then_some("true")}
            onclick={onclick}
        >
            {props.label.clone()}
        </a>
    }
}

#[derive(Properties, PartialEq)]
struct HexagonButtonProps {
    snapshot: ButtonSnapshot,
    label: AttrValue,
}

#[function_component(HexagonButton)]
fn hexagon_button(props: &HexagonButtonProps) -> Html {
    let snapshot = &props.snapshot;
    let onclick = Callback::from(|_: MouseEvent| scroll_to_section("somnlogg"));

    html! {
        <button
            type="button"
            class={classes!(
                "hexagon-button",
                snapshot.position_mode.as_str(),
                snapshot.button_state.as_str()
            )}
            style={hexagon_style(snapshot)}
            aria-hidden={(!snapshot.should_be_visible).then_some("true")}
            tabindex={(!snapshot.should_be_visible).then_some("-1")}
            onclick={onclick}
        >
            <span class="hexagon-shape" aria-hidden="true">{"⬢"}</span>
            <span class="sr-only">{props.label.clone()}</span>
        </button>
    }
}

#[derive(Properties, PartialEq)]
struct PageProps {
    tracking: TrackingConfig,
}

#[function_component(Page)]
fn page(props: &PageProps) -> Html {
    let preferences = use_preferences();
    let show_grid = use_state(|| false);
    let tracking = props.tracking;

    let navigation = use_section_navigation(NavigationConfig::new(SECTION_IDS, tracking));
    let detection = use_section_detection(DetectionConfig::new(SECTION_IDS, tracking));
    let button = use_hexagon_button_state(ButtonConfig::new(tracking), *show_grid);

    let on_toggle_grid = {
        let show_grid = show_grid.clone();
        Callback::from(move |_| show_grid.set(!*show_grid))
    };
    let on_toggle_theme = {
        let toggle = preferences.toggle_theme.clone();
        Callback::from(move |_| toggle.emit(()))
    };
    let on_toggle_locale = {
        let toggle = preferences.toggle_locale.clone();
        Callback::from(move |_| toggle.emit(()))
    };

    let prefs = preferences.preferences;
    let sections = section_copy(prefs.locale);
    let skip_label = match prefs.locale {
        Locale::En => "Skip to main content",
        Locale::Sv => "Hoppa till innehållet",
    };
    let is_active = |id: &str| {
        detection
            .as_ref()
            .map(|snapshot| snapshot.active_sections.iter().any(|active| active == id))
            .unwrap_or(false)
    };

    html! {
        <>
            <a class="skip-link" href="#content">{skip_label}</a>
            <header class="site-header" data-direction={navigation.scroll_direction.as_str()}>
                <nav class="site-nav">
                    { for sections.iter().map(|section| html! {
                        <NavLink
                            section_id={section.id}
                            label={section.nav_label}
                            current={navigation.current_section == section.id}
                        />
                    }) }
                </nav>
                <div class="header-controls">
                    <button
                        class="grid-toggle"
                        type="button"
                        aria-pressed={(*show_grid).to_string()}
                        onclick={on_toggle_grid}
                    >
                        {grid_toggle_label(prefs.locale, *show_grid)}
                    </button>
                    <button
                        class="locale-toggle"
                        type="button"
                        onclick={on_toggle_locale}
                    >
                        {prefs.locale.toggled().as_str().to_ascii_uppercase()}
                    </button>
                    <button
                        class="theme-toggle"
                        type="button"
                        aria-label={prefs.toggle_label()}
                        aria-pressed={prefs.theme.pressed().to_string()}
                        onclick={on_toggle_theme}
                    >
                        <span aria-hidden="true">{prefs.theme.icon()}</span>
                    </button>
                </div>
            </header>

            <HexagonButton snapshot={button} label="Somnlogg" />

            <main id="content">
                { for sections.iter().map(|section| html! {
                    <section
                        id={section.id}
                        class={classes!("section-block", is_active(section.id).then_some("is-active"))}
                        aria-labelledby={format!("{}-heading", section.id)}
                    >
                        <h2 id={format!("{}-heading", section.id)}>{section.heading}</h2>
                        <p>{section.body}</p>
                    </section>
                }) }
            </main>

            if *show_grid {
                <div class="grid-overlay" aria-hidden="true" />
            }
        </>
    }
}

#[derive(Properties, PartialEq)]
struct AppProps {
    tracking: TrackingConfig,
}

#[function_component(App)]
fn app(props: &AppProps) -> Html {
    html! {
        <PreferencesProvider>
            <Page tracking={props.tracking} />
        </PreferencesProvider>
    }
}

pub fn run() {
    let Some(root) = mount_element() else {
        log_event(
            LogLevel::Info,
            "mount_missing",
            json!({ "id": MOUNT_ID }),
        );
        return;
    };

    let tracking = tracking_from_mount(&root);
    set_min_level(tracking.log_level);
    log_event(
        LogLevel::Info,
        "tracking_configured",
        json!({ "tracking": tracking.entries() }),
    );

    yew::Renderer::<App>::with_root_and_props(root, AppProps { tracking }).render();
}
