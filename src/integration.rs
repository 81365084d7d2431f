//! Integration module for connecting object detection backends with the
//! tracker and the depth fuser.
//!
//! This module provides the detector trait, detection construction helpers,
//! and a pipeline running detection, tracking and fusion once per frame.

mod builder;
mod detector;
mod pipeline;

pub use builder::DetectionBuilder;
pub use detector::{Detection, DetectionSource, IntoDetections};
pub use pipeline::{FrameReport, PipelineConfig, TrackSnapshot, TrackerPipeline};
