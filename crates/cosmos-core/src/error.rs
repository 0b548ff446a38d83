use thiserror::Error;

/// Errors surfaced by engine constructors and parsers.
///
/// None of these ever reach the page: callers log them and omit the effect.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CosmosError {
    #[error("render backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("frame skipped: {0}")]
    FrameSkipped(String),
    #[error("unknown easing `{0}`")]
    UnknownEasing(String),
    #[error("malformed anchor `{0}`")]
    MalformedAnchor(String),
    #[error("malformed region: start {start}px is not before end {end}px")]
    MalformedRegion { start: f32, end: f32 },
    #[error("timeline has no keyframes")]
    EmptyTimeline,
    #[error("invalid bounds: {0}")]
    InvalidBounds(String),
    #[error("invalid position parameter `{0}`")]
    InvalidPosition(String),
}

pub type Result<T> = std::result::Result<T, CosmosError>;
