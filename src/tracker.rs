mod matching;
mod rect;
mod registry;
mod track;

pub use matching::{
    AssignmentKind, AssignmentResult, AssignmentStrategy, GreedyAssignment, OptimalAssignment,
    distance_matrix,
};
pub use rect::{BBox, Centroid};
pub use registry::{TrackRegistry, TrackerConfig, UnmatchedPolicy};
pub use track::{Track, TrackId};
