use thiserror::Error;

/// Typed failures surfaced by the analysis engine.
///
/// Everything else the engine meets in recorded data (missing channels,
/// unmatched phases, malformed profiles) is recovered locally.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("shot has no samples")]
    MissingSamples,
    #[error("invalid settings: {0}")]
    InvalidSettings(&'static str),
}

pub type Result<T> = eyre::Result<T>;
