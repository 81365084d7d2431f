//! Per-frame association of track centroids with boxes and their median depth.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fusion::DepthMap;
use crate::tracker::{BBox, Centroid, TrackId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// A box is re-associated with a track when both center offsets are
    /// strictly below this many pixels.
    pub proximity_tolerance: u32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            proximity_tolerance: 10,
        }
    }
}

impl FusionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.proximity_tolerance == 0 {
            return Err(ConfigError::InvalidProximityTolerance);
        }
        Ok(())
    }
}

/// Distance estimate for a track that was re-associated with a box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceReading {
    /// Median depth inside the box, in depth map units.
    Measured(f32),
    /// The box was found but covers no valid depth sample.
    NoReading,
}

impl DistanceReading {
    pub fn value(self) -> Option<f32> {
        match self {
            Self::Measured(d) => Some(d),
            Self::NoReading => None,
        }
    }
}

/// Stateless fuser of track positions with the current depth map.
#[derive(Debug, Clone)]
pub struct DistanceFuser {
    config: FusionConfig,
}

impl DistanceFuser {
    pub fn new(config: FusionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Find the box of this frame that belongs to `centroid`.
    ///
    /// Several boxes may lie within the tolerance; the first one in input
    /// order wins.
    pub fn locate<'a>(&self, centroid: Centroid, boxes: &'a [BBox]) -> Option<&'a BBox> {
        let tol = i64::from(self.config.proximity_tolerance);
        boxes.iter().find(|bbox| {
            let center = bbox.center_floor();
            (i64::from(center.x) - i64::from(centroid.x)).abs() < tol
                && (i64::from(center.y) - i64::from(centroid.y)).abs() < tol
        })
    }

    /// Distance reading for every track that maps back to one of `boxes`.
    /// Tracks without a nearby box are left out of the result.
    pub fn fuse(
        &self,
        depth: &DepthMap,
        boxes: &[BBox],
        objects: &BTreeMap<TrackId, Centroid>,
    ) -> BTreeMap<TrackId, DistanceReading> {
        objects
            .iter()
            .filter_map(|(&id, &centroid)| {
                let bbox = self.locate(centroid, boxes)?;
                let reading = depth
                    .region_median(bbox)
                    .map_or(DistanceReading::NoReading, DistanceReading::Measured);
                Some((id, reading))
            })
            .collect()
    }
}
