//! Depth fusion: attaching a distance reading to every tracked identity.

mod depth_map;
mod fuser;

pub use depth_map::{DepthMap, median};
pub use fuser::{DistanceFuser, DistanceReading, FusionConfig};
