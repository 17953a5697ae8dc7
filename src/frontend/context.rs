use js_sys::{Function, Reflect};
use serde_json::json;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{window, Storage};
use yew::prelude::*;

use portfolio_sections::logging::{log_event, LogLevel};
use portfolio_sections::preferences::{Locale, Preferences, Theme, LOCALE_KEY, THEME_KEY};

fn local_storage() -> Option<Storage> {
    window()?.local_storage().ok().flatten()
}

fn read_stored(key: &str) -> Option<String> {
    local_storage()?.get_item(key).ok().flatten()
}

fn persist(key: &str, value: &str) {
    if let Some(storage) = local_storage() {
        let _ = storage.set_item(key, value);
    }
}

fn media_matches(query: &str) -> bool {
    window()
        .and_then(|w| w.match_media(query).ok().flatten())
        .map(|mq| mq.matches())
        .unwrap_or(false)
}

fn browser_language() -> Option<String> {
    window()?.navigator().language()
}

fn resolve_preferences() -> Preferences {
    Preferences {
        theme: Theme::resolve(
            read_stored(THEME_KEY).as_deref(),
            media_matches("(prefers-color-scheme: dark)"),
        ),
        locale: Locale::resolve(
            read_stored(LOCALE_KEY).as_deref(),
            browser_language().as_deref(),
        ),
    }
}

fn set_root_attribute(name: &str, value: &str) {
    if let Some(root) = window()
        .and_then(|w| w.document())
        .and_then(|document| document.document_element())
    {
        let _ = root.set_attribute(name, value);
    }
}

fn apply_theme(theme: Theme) {
    set_root_attribute("data-theme", theme.as_str());
}

fn apply_locale(locale: Locale) {
    set_root_attribute("lang", locale.as_str());
}

fn apply_theme_with_transition(theme: Theme) {
    if media_matches("(prefers-reduced-motion: reduce)") {
        apply_theme(theme);
        return;
    }

    let Some(document) = window().and_then(|w| w.document()) else {
        apply_theme(theme);
        return;
    };

    let document_js: JsValue = document.into();
    let Ok(start_view_transition) =
        Reflect::get(&document_js, &JsValue::from_str("startViewTransition"))
    else {
        apply_theme(theme);
        return;
    };

    let Some(start_view_transition) = start_view_transition.dyn_ref::<Function>() else {
        apply_theme(theme);
        return;
    };

    let callback = Closure::once_into_js(move || apply_theme(theme));
    if start_view_transition.call1(&document_js, &callback).is_err() {
        apply_theme(theme);
    }
}

fn log_preferences(preferences: Preferences) {
    log_event(
        LogLevel::Debug,
        "preferences_changed",
        json!({
            "theme": preferences.theme.as_str(),
            "locale": preferences.locale.as_str(),
        }),
    );
}

#[derive(Clone, PartialEq)]
pub struct PreferencesContext {
    pub preferences: Preferences,
    pub toggle_theme: Callback<()>,
    pub toggle_locale: Callback<()>,
}

#[derive(Properties, PartialEq)]
pub struct PreferencesProviderProps {
    #[prop_or_default]
    pub children: Html,
}

#[function_component(PreferencesProvider)]
pub fn preferences_provider(props: &PreferencesProviderProps) -> Html {
    let preferences = use_state(resolve_preferences);

    {
        let current = *preferences;
        use_effect_with((), move |_| {
            apply_theme(current.theme);
            apply_locale(current.locale);
            || ()
        });
    }

    let toggle_theme = {
        let preferences = preferences.clone();
        Callback::from(move |_| {
            let next = Preferences {
                theme: preferences.theme.toggled(),
                ..*preferences
            };
            persist(THEME_KEY, next.theme.as_str());
            apply_theme_with_transition(next.theme);
            log_preferences(next);
            preferences.set(next);
        })
    };

    let toggle_locale = {
        let preferences = preferences.clone();
        Callback::from(move |_| {
            let next = Preferences {
                locale: preferences.locale.toggled(),
                ..*preferences
            };
            persist(LOCALE_KEY, next.locale.as_str());
            apply_locale(next.locale);
            log_preferences(next);
            preferences.set(next);
        })
    };

    let context = PreferencesContext {
        preferences: *preferences,
        toggle_theme,
        toggle_locale,
    };

    html! {
        <ContextProvider<PreferencesContext> context={context}>
            {props.children.clone()}
        </ContextProvider<PreferencesContext>>
    }
}

/// Falls back to the stored preferences, read-only, outside a provider.
#[hook]
pub fn use_preferences() -> PreferencesContext {
    use_context::<PreferencesContext>().unwrap_or_else(|| PreferencesContext {
        preferences: resolve_preferences(),
        toggle_theme: Callback::from(|_| ()),
        toggle_locale: Callback::from(|_| ()),
    })
}
