//! TrackerPipeline for combining detection, tracking and depth fusion.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, PipelineError};
use crate::fusion::{DepthMap, DistanceFuser, DistanceReading, FusionConfig};
use crate::tracker::{BBox, Centroid, TrackId, TrackRegistry, TrackerConfig};

use super::{DetectionSource, IntoDetections};

/// Full configuration surface of a [`TrackerPipeline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Detections must score strictly above this to reach the tracker.
    pub min_confidence: f32,
    pub tracker: TrackerConfig,
    pub fusion: FusionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            tracker: TrackerConfig::default(),
            fusion: FusionConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a JSON document. Missing fields take their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_confidence.is_finite() {
            return Err(ConfigError::InvalidMinConfidence(self.min_confidence));
        }
        self.tracker.validate()?;
        self.fusion.validate()
    }
}

/// State of one live track after a frame, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSnapshot {
    pub id: TrackId,
    pub centroid: Centroid,
    pub disappeared_count: u32,
    /// Historical positions, oldest first.
    pub path: Vec<Centroid>,
    /// `None` when no box of this frame maps back to the track.
    pub distance: Option<DistanceReading>,
}

/// Everything a frame produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// 1-based index of the frame within the pipeline.
    pub frame_id: u64,
    /// Boxes that passed the confidence filter, in detector order.
    pub boxes: Vec<BBox>,
    /// Live tracks in id order.
    pub tracks: Vec<TrackSnapshot>,
}

impl FrameReport {
    pub fn track(&self, id: TrackId) -> Option<&TrackSnapshot> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// The `{id: centroid}` mapping of live tracks.
    pub fn objects(&self) -> BTreeMap<TrackId, Centroid> {
        self.tracks.iter().map(|t| (t.id, t.centroid)).collect()
    }

    /// Readings of the tracks that were re-associated with a box.
    pub fn distances(&self) -> BTreeMap<TrackId, DistanceReading> {
        self.tracks
            .iter()
            .filter_map(|t| t.distance.map(|d| (t.id, d)))
            .collect()
    }
}

/// Runs a `DetectionSource`, the [`TrackRegistry`] and the [`DistanceFuser`]
/// once per frame.
#[derive(Debug)]
pub struct TrackerPipeline<D: DetectionSource> {
    detector: D,
    registry: TrackRegistry,
    fuser: DistanceFuser,
    min_confidence: f32,
    frame_id: u64,
}

impl<D: DetectionSource> TrackerPipeline<D> {
    /// Create a new tracking pipeline with the given detector and config.
    pub fn new(detector: D, config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            detector,
            registry: TrackRegistry::new(config.tracker)?,
            fuser: DistanceFuser::new(config.fusion)?,
            min_confidence: config.min_confidence,
            frame_id: 0,
        })
    }

    /// Create a new tracking pipeline with the default configuration.
    pub fn with_default_config(detector: D) -> Result<Self, ConfigError> {
        Self::new(detector, PipelineConfig::default())
    }

    /// Detect, track and fuse one frame.
    ///
    /// `depth` must be pixel-aligned with the colour image, i.e. have the
    /// same width and height.
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
        depth: &DepthMap,
    ) -> Result<FrameReport, PipelineError<D::Error>> {
        let (width_px, height_px) = (width as usize, height as usize);
        if depth.width() != width_px || depth.height() != height_px {
            return Err(PipelineError::DepthShape {
                width: width_px,
                height: height_px,
                actual_width: depth.width(),
                actual_height: depth.height(),
            });
        }

        let detections = self
            .detector
            .detect(input, width, height)
            .map_err(PipelineError::Detection)?;
        Ok(self.track_frame(detections, depth))
    }

    /// Track and fuse one frame of already computed detections.
    pub fn track_frame<I: IntoDetections>(&mut self, detections: I, depth: &DepthMap) -> FrameReport {
        self.frame_id += 1;

        let boxes: Vec<BBox> = detections
            .into_detections()
            .iter()
            .filter(|d| d.score > self.min_confidence)
            .filter_map(|d| d.to_bbox())
            .collect();

        let objects = self.registry.update(&boxes);
        let distances = self.fuser.fuse(depth, &boxes, &objects);
        debug!(
            frame_id = self.frame_id,
            boxes = boxes.len(),
            tracks = objects.len(),
            readings = distances.len(),
            "processed frame"
        );

        let tracks = self
            .registry
            .tracks()
            .map(|track| TrackSnapshot {
                id: track.id(),
                centroid: track.centroid(),
                disappeared_count: track.disappeared_count(),
                path: track.path().iter().copied().collect(),
                distance: distances.get(&track.id()).copied(),
            })
            .collect();

        FrameReport {
            frame_id: self.frame_id,
            boxes,
            tracks,
        }
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the underlying track registry.
    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    pub fn fuser(&self) -> &DistanceFuser {
        &self.fuser
    }
}
