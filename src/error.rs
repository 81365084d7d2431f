//! Error types.

use thiserror::Error;

/// Rejected configuration values. Raised once, at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_distance must be a finite positive number of pixels, got {0}")]
    InvalidMaxDistance(f64),

    #[error("proximity_tolerance must be at least one pixel")]
    InvalidProximityTolerance,

    #[error("min_confidence must be a finite number, got {0}")]
    InvalidMinConfidence(f32),

    #[error("max_path_len must keep at least one point when set")]
    InvalidPathCapacity,

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A flat depth buffer that does not fit the requested frame size.
#[derive(Debug, Error)]
#[error("depth buffer of {len} values does not fit a {width}x{height} frame")]
pub struct DepthMapError {
    pub width: usize,
    pub height: usize,
    pub len: usize,
}

/// Per-frame pipeline failures.
#[derive(Debug, Error)]
pub enum PipelineError<E>
where
    E: std::error::Error + 'static,
{
    #[error("detection backend failed")]
    Detection(#[source] E),

    #[error("depth map is {actual_width}x{actual_height}, frame is {width}x{height}")]
    DepthShape {
        width: usize,
        height: usize,
        actual_width: usize,
        actual_height: usize,
    },
}
