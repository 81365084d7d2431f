//! Track registry: per-frame centroid association and track lifecycle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::tracker::matching::{self, AssignmentKind, AssignmentResult, AssignmentStrategy};
use crate::tracker::rect::{BBox, Centroid};
use crate::tracker::track::{Track, TrackId};

/// Configuration for the [`TrackRegistry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Consecutive missed frames a track survives. It is retired on the
    /// frame its miss count goes above this value.
    pub max_disappeared: u32,
    /// Largest centroid displacement in pixels accepted as a match.
    pub max_distance: f64,
    pub assignment: AssignmentKind,
    pub unmatched_policy: UnmatchedPolicy,
    /// Cap on stored path points per track. `None` keeps the full history.
    pub max_path_len: Option<usize>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_disappeared: 30,
            max_distance: 50.0,
            assignment: AssignmentKind::Greedy,
            unmatched_policy: UnmatchedPolicy::SizeBranched,
            max_path_len: None,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_distance.is_finite() || self.max_distance <= 0.0 {
            return Err(ConfigError::InvalidMaxDistance(self.max_distance));
        }
        if self.max_path_len == Some(0) {
            return Err(ConfigError::InvalidPathCapacity);
        }
        Ok(())
    }
}

/// What happens to tracks and centroids left over after association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// When there are at least as many tracks as centroids, leftover tracks
    /// count a miss and leftover centroids are dropped. Otherwise leftover
    /// centroids become new tracks and leftover tracks are left untouched
    /// for this frame.
    #[default]
    SizeBranched,
    /// Leftover tracks always count a miss and leftover centroids always
    /// become new tracks.
    Symmetric,
}

/// Owns the live tracks and maps each frame's boxes onto them.
///
/// A registry serves a single pipeline; `update` takes `&mut self`, so
/// concurrent use needs one registry per pipeline or external serialization.
#[derive(Debug)]
pub struct TrackRegistry {
    tracks: BTreeMap<TrackId, Track>,
    next_id: TrackId,
    config: TrackerConfig,
    strategy: Box<dyn AssignmentStrategy>,
}

impl TrackRegistry {
    /// Create a registry using the assignment strategy named in `config`.
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        let strategy = config.assignment.strategy();
        Self::with_strategy(config, strategy)
    }

    /// Create a registry with a caller-supplied assignment strategy. The
    /// `assignment` field of `config` is ignored.
    pub fn with_strategy(
        config: TrackerConfig,
        strategy: Box<dyn AssignmentStrategy>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tracks: BTreeMap::new(),
            next_id: 0,
            config,
            strategy,
        })
    }

    /// Feed one frame of confidence-filtered boxes and return the position of
    /// every live track, including those not matched in this frame.
    ///
    /// An empty slice means nothing was detected: every track counts a miss.
    pub fn update(&mut self, boxes: &[BBox]) -> BTreeMap<TrackId, Centroid> {
        if boxes.is_empty() {
            let ids: Vec<TrackId> = self.tracks.keys().copied().collect();
            for id in ids {
                self.mark_missed(id);
            }
            return self.objects();
        }

        let centroids: Vec<Centroid> = boxes.iter().map(BBox::centroid).collect();

        if self.tracks.is_empty() {
            for centroid in centroids {
                self.register(centroid);
            }
            return self.objects();
        }

        let (ids, track_centroids): (Vec<TrackId>, Vec<Centroid>) =
            self.tracks.values().map(|t| (t.id(), t.centroid())).unzip();
        let costs = matching::distance_matrix(&track_centroids, &centroids);

        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = self.strategy.assign(&costs, self.config.max_distance);

        for (row, col) in matches {
            if let Some(track) = self.tracks.get_mut(&ids[row]) {
                trace!(
                    track_id = ids[row],
                    distance = costs[[row, col]],
                    "matched track"
                );
                track.mark_matched(centroids[col]);
            }
        }

        let shrinking = ids.len() >= centroids.len();
        let symmetric = self.config.unmatched_policy == UnmatchedPolicy::Symmetric;

        if shrinking || symmetric {
            for row in unmatched_tracks {
                self.mark_missed(ids[row]);
            }
        }
        if !shrinking || symmetric {
            for col in unmatched_detections {
                self.register(centroids[col]);
            }
        }

        self.objects()
    }

    /// Current `{id: centroid}` mapping, in id order.
    pub fn objects(&self) -> BTreeMap<TrackId, Centroid> {
        self.tracks
            .iter()
            .map(|(&id, track)| (id, track.centroid()))
            .collect()
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    /// Live tracks in id order.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn path(&self, id: TrackId) -> Option<impl Iterator<Item = &Centroid>> {
        self.tracks.get(&id).map(|t| t.path().iter())
    }

    /// Tracks that have moved at least once, i.e. whose path has a segment
    /// to draw.
    pub fn trajectories(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values().filter(|t| t.path().len() > 1)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Id the next registered track will receive.
    pub fn next_id(&self) -> TrackId {
        self.next_id
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    fn register(&mut self, centroid: Centroid) {
        let id = self.next_id;
        self.next_id += 1;
        debug!(track_id = id, x = centroid.x, y = centroid.y, "registered track");
        self.tracks
            .insert(id, Track::new(id, centroid, self.config.max_path_len));
    }

    fn mark_missed(&mut self, id: TrackId) {
        let expired = match self.tracks.get_mut(&id) {
            Some(track) => track.mark_missed() > self.config.max_disappeared,
            None => false,
        };
        if expired {
            self.tracks.remove(&id);
            debug!(track_id = id, "retired track");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn box_at(cx: i32, cy: i32) -> BBox {
        BBox::new(cx - 10, cy - 10, cx + 10, cy + 10)
    }

    fn registry(max_disappeared: u32, max_distance: f64) -> TrackRegistry {
        TrackRegistry::new(TrackerConfig {
            max_disappeared,
            max_distance,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_lifecycle_scenario() {
        let mut reg = registry(2, 50.0);

        let objects = reg.update(&[box_at(100, 100)]);
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[&0], Centroid::new(100, 100));

        let objects = reg.update(&[box_at(105, 102)]);
        assert_eq!(objects[&0], Centroid::new(105, 102));
        let path: Vec<Centroid> = reg.path(0).unwrap().copied().collect();
        assert_eq!(path, vec![Centroid::new(100, 100), Centroid::new(105, 102)]);

        reg.update(&[]);
        assert_eq!(reg.get(0).unwrap().disappeared_count(), 1);
        let objects = reg.update(&[]);
        assert_eq!(reg.get(0).unwrap().disappeared_count(), 2);
        assert!(objects.contains_key(&0));

        let objects = reg.update(&[]);
        assert!(objects.is_empty());
        assert!(reg.get(0).is_none());
    }

    #[test]
    fn test_single_detection_goes_to_nearest_track() {
        let mut reg = registry(5, 50.0);
        reg.update(&[box_at(10, 10), box_at(500, 500)]);

        let objects = reg.update(&[box_at(12, 11)]);
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[&0], Centroid::new(12, 11));
        assert_eq!(reg.get(0).unwrap().disappeared_count(), 0);
        assert_eq!(reg.get(1).unwrap().disappeared_count(), 1);
        assert_eq!(reg.next_id(), 2);
    }

    #[test]
    fn test_far_detection_with_more_detections_registers() {
        let mut reg = registry(5, 50.0);
        reg.update(&[box_at(100, 100)]);

        let objects = reg.update(&[box_at(300, 300), box_at(102, 100)]);
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[&0], Centroid::new(102, 100));
        assert_eq!(objects[&1], Centroid::new(300, 300));
    }

    #[test]
    fn test_far_detection_with_equal_counts_is_dropped() {
        let mut reg = registry(5, 50.0);
        reg.update(&[box_at(100, 100)]);

        // Same number of tracks and detections: the unmatched detection is
        // not registered and the track counts a miss.
        let objects = reg.update(&[box_at(400, 400)]);
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[&0], Centroid::new(100, 100));
        assert_eq!(reg.get(0).unwrap().disappeared_count(), 1);
    }

    #[test]
    fn test_growing_set_leaves_unmatched_tracks_untouched() {
        let mut reg = registry(0, 50.0);
        reg.update(&[box_at(100, 100)]);

        // Two far detections, one track: both register, the track is not
        // charged a miss even though max_disappeared is zero.
        let objects = reg.update(&[box_at(400, 400), box_at(600, 600)]);
        assert_eq!(objects.len(), 3);
        assert_eq!(reg.get(0).unwrap().disappeared_count(), 0);
    }

    #[test]
    fn test_symmetric_policy_does_both() {
        let mut reg = TrackRegistry::new(TrackerConfig {
            max_disappeared: 0,
            unmatched_policy: UnmatchedPolicy::Symmetric,
            ..Default::default()
        })
        .unwrap();
        reg.update(&[box_at(100, 100)]);

        let objects = reg.update(&[box_at(400, 400)]);
        assert_eq!(objects.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_empty_registry_with_empty_frame() {
        let mut reg = registry(1, 50.0);
        assert!(reg.update(&[]).is_empty());
        assert_eq!(reg.next_id(), 0);
    }

    #[test]
    fn test_ids_not_reused_after_retirement() {
        let mut reg = registry(0, 50.0);
        reg.update(&[box_at(100, 100)]);
        reg.update(&[]);
        assert!(reg.is_empty());

        let objects = reg.update(&[box_at(100, 100)]);
        assert_eq!(objects.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_trajectories_only_moved_tracks() {
        let mut reg = registry(5, 50.0);
        reg.update(&[box_at(10, 10), box_at(500, 500)]);
        reg.update(&[box_at(12, 12), box_at(500, 500)]);
        reg.update(&[box_at(14, 14), box_at(700, 700), box_at(500, 500)]);

        // Every matched frame extends the path, stationary or not.
        let ids: Vec<TrackId> = reg.trajectories().map(Track::id).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(reg.get(2).unwrap().path().len(), 1);
    }

    #[test]
    fn test_optimal_strategy_avoids_greedy_swap() {
        let config = TrackerConfig {
            assignment: AssignmentKind::Optimal,
            ..Default::default()
        };
        let mut reg = TrackRegistry::new(config).unwrap();
        reg.update(&[box_at(100, 100), box_at(130, 100)]);

        // Both tracks prefer (125,100); greedy hands it to track 1 and
        // strands track 0, the optimal solver moves track 0 to (60,100).
        let objects = reg.update(&[box_at(125, 100), box_at(60, 100)]);
        assert_eq!(objects[&0], Centroid::new(60, 100));
        assert_eq!(objects[&1], Centroid::new(125, 100));
        assert_eq!(reg.get(0).unwrap().disappeared_count(), 0);
    }

    /// Pairs row `i` with column `i`, ignoring costs.
    #[derive(Debug)]
    struct Diagonal;

    impl AssignmentStrategy for Diagonal {
        fn assign(&self, costs: &ndarray::Array2<f64>, _max_distance: f64) -> AssignmentResult {
            let (rows, cols) = costs.dim();
            let n = rows.min(cols);
            AssignmentResult {
                matches: (0..n).map(|i| (i, i)).collect(),
                unmatched_tracks: (n..rows).collect(),
                unmatched_detections: (n..cols).collect(),
            }
        }
    }

    #[test]
    fn test_custom_strategy_drives_matching() {
        let mut reg = TrackRegistry::with_strategy(TrackerConfig::default(), Box::new(Diagonal))
            .unwrap();
        reg.update(&[box_at(10, 10), box_at(500, 500)]);

        // Nearest-neighbour would keep both in place; the diagonal strategy
        // swaps them by input order.
        let objects = reg.update(&[box_at(500, 500), box_at(10, 10)]);
        assert_eq!(objects[&0], Centroid::new(500, 500));
        assert_eq!(objects[&1], Centroid::new(10, 10));
        assert_eq!(reg.next_id(), 2);
    }

    #[test]
    fn test_huge_coordinates_track_without_overflow() {
        let mut reg = registry(1, 50.0);
        let objects = reg.update(&[BBox::new(2_000_000_000, 0, 2_100_000_000, 10)]);
        assert_eq!(objects[&0], Centroid::new(2_050_000_000, 5));

        let objects = reg.update(&[BBox::new(2_000_000_010, 0, 2_100_000_010, 10)]);
        assert_eq!(objects[&0], Centroid::new(2_050_000_010, 5));

        let objects = reg.update(&[BBox::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX)]);
        assert_eq!(objects.len(), 1);
        assert_eq!(reg.get(0).unwrap().disappeared_count(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        for max_distance in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = TrackerConfig {
                max_distance,
                ..Default::default()
            };
            assert!(matches!(
                TrackRegistry::new(config),
                Err(ConfigError::InvalidMaxDistance(_))
            ));
        }

        let config = TrackerConfig {
            max_path_len: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            TrackRegistry::new(config),
            Err(ConfigError::InvalidPathCapacity)
        ));
    }
}
