//! Single tracked identity.

use std::collections::VecDeque;

use crate::tracker::rect::Centroid;

/// Identifier of a track. Unique for the lifetime of its registry.
pub type TrackId = u64;

/// One persistent identity followed across frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    id: TrackId,
    centroid: Centroid,
    disappeared: u32,
    path: VecDeque<Centroid>,
    max_path_len: Option<usize>,
}

impl Track {
    /// Register a new track at `centroid`. The path starts with that point.
    pub(crate) fn new(id: TrackId, centroid: Centroid, max_path_len: Option<usize>) -> Self {
        let mut path = VecDeque::with_capacity(max_path_len.unwrap_or(16).min(1024));
        path.push_back(centroid);
        Self {
            id,
            centroid,
            disappeared: 0,
            path,
            max_path_len,
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    /// Center of the box this track was last matched to.
    pub fn centroid(&self) -> Centroid {
        self.centroid
    }

    /// Consecutive frames since the last successful match.
    pub fn disappeared_count(&self) -> u32 {
        self.disappeared
    }

    /// Historical positions, oldest first. Never empty.
    pub fn path(&self) -> &VecDeque<Centroid> {
        &self.path
    }

    /// Adopt the matched centroid, reset the miss counter and extend the path.
    pub(crate) fn mark_matched(&mut self, centroid: Centroid) {
        self.centroid = centroid;
        self.disappeared = 0;
        if let Some(cap) = self.max_path_len {
            while self.path.len() >= cap {
                self.path.pop_front();
            }
        }
        self.path.push_back(centroid);
    }

    /// Count one more frame without a match and return the new count.
    pub(crate) fn mark_missed(&mut self) -> u32 {
        self.disappeared = self.disappeared.saturating_add(1);
        self.disappeared
    }
}
