use thiserror::Error;

/// Rejected tracker construction. Runtime updates never fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("at least one section id is required")]
    NoSections,
    #[error("section id `{0}` is configured more than once")]
    DuplicateSection(String),
    #[error("section id must not be empty")]
    EmptySectionId,
    #[error("threshold band enter={enter} exit={exit} must satisfy 0 <= exit <= enter <= 1")]
    InvalidBand { enter: f64, exit: f64 },
}

/// Failure to wire a tracker into the browser. Callers log it and fall back
/// to a binding that never fires.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttachError {
    #[error("no window is available")]
    NoWindow,
    #[error("no document is available")]
    NoDocument,
    #[error("browser rejected {what}: {message}")]
    Rejected { what: &'static str, message: String },
}
