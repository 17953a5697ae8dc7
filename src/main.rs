#[cfg(target_arch = "wasm32")]
mod frontend;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use portfolio_sections::config::TrackingConfig;
    use portfolio_sections::logging::{log_event, set_min_level, LogLevel};

    let tracking = TrackingConfig::from_env();
    set_min_level(tracking.log_level);
    log_event(
        LogLevel::Info,
        "frontend_only",
        serde_json::json!({
            "hint": "Run `trunk serve` or `trunk build --release`; set data-* attributes on #app to tune tracking.",
            "tracking": tracking.entries(),
        }),
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    frontend::run();
}
