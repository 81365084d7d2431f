//! Centroid tracking of per-frame object detections, with a median depth
//! reading attached to every tracked identity.
//!
//! The crate has two cooperating parts:
//!
//! - [`TrackRegistry`] keeps persistent identities alive across frames using a
//!   greedy bounded nearest-neighbour association of box centroids.
//! - [`DistanceFuser`] maps each live identity back to a box of the current
//!   frame and reports the median depth inside it.
//!
//! [`TrackerPipeline`] glues both to a detection backend.

pub mod error;
pub mod fusion;
pub mod integration;
pub mod tracker;

pub use error::{ConfigError, DepthMapError, PipelineError};
pub use fusion::{DepthMap, DistanceFuser, DistanceReading, FusionConfig};
pub use integration::{
    Detection, DetectionBuilder, DetectionSource, FrameReport, PipelineConfig, TrackSnapshot,
    TrackerPipeline,
};
pub use tracker::{
    AssignmentKind, AssignmentStrategy, BBox, Centroid, GreedyAssignment, OptimalAssignment,
    Track, TrackId, TrackRegistry, TrackerConfig, UnmatchedPolicy,
};
