//! Error types for codimg.
//!
//! Uses thiserror for structured errors with context. The taxonomy follows the
//! lifecycle of the crate's objects:
//! - Graph construction fails with [`CodError`] (incompatible regions, missing
//!   operands, deferred images that disagree with their template)
//! - Image storage fails with [`ImageError`]
//! - Filter configuration and `update()` fail with [`FilterError`]
//! - Configuration loading fails with [`ConfigError`]

use crate::cod::RegionInfo;
use crate::core::geometry::Point;
use thiserror::Error;

/// Top-level error type for codimg.
///
/// This enum encompasses all error categories and enables automatic
/// conversion between specific error types.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Graph error: {0}")]
    Cod(#[from] CodError),

    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while building or preparing compute-on-demand graphs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodError {
    #[error("Incompatible operands: {left} vs {right}")]
    Incompatible { left: RegionInfo, right: RegionInfo },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

/// Errors from image storage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("Size mismatch: expected {expected} elements, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Point {point} is outside the image domain")]
    OutOfDomain { point: Point },

    #[error("Image region is empty")]
    EmptyRegion,
}

/// Errors from image filters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Required input '{0}' was not set")]
    MissingInput(&'static str),

    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Cod(#[from] CodError),

    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Errors while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Error Utilities
// ============================================================================

impl CodError {
    /// Construction-time errors caused by the shape of the graph rather than
    /// by a bad argument value.
    pub fn is_structural(&self) -> bool {
        matches!(self, CodError::Incompatible { .. })
    }
}

impl FilterError {
    pub(crate) fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        FilterError::InvalidParameter {
            parameter,
            reason: reason.into(),
        }
    }
}

/// Result type alias for codimg operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for graph operations.
pub type CodResult<T> = std::result::Result<T, CodError>;

/// Result type alias for image operations.
pub type ImageResult<T> = std::result::Result<T, ImageError>;

/// Result type alias for filter operations.
pub type FilterResult<T> = std::result::Result<T, FilterError>;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
