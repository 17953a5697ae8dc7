//! Scroll-driven section tracking for a single-page portfolio.
//!
//! Every tracker here is plain state fed with timestamps and measurements;
//! the browser wiring lives in the wasm frontend.

pub mod button;
pub mod config;
pub mod detection;
pub mod direction;
pub mod error;
pub mod hexagon;
pub mod logging;
pub mod measurement;
pub mod navigation;
pub mod preferences;
pub mod resolver;
pub mod thresholds;
pub mod timer;
pub mod tracker;
