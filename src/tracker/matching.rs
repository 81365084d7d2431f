//! Association of existing tracks with the centroids of a new frame.

use std::fmt;

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::tracker::rect::Centroid;

/// Cost assigned to pairs that exceed the distance ceiling before solving
/// the optimal assignment.
const GATED_COST: f64 = 1e6;

/// Compute the Euclidean distance matrix between track centroids (rows) and
/// detection centroids (columns).
pub fn distance_matrix(tracks: &[Centroid], detections: &[Centroid]) -> Array2<f64> {
    let mut dists = Array2::zeros((tracks.len(), detections.len()));
    for (i, t) in tracks.iter().enumerate() {
        for (j, d) in detections.iter().enumerate() {
            dists[[i, j]] = t.distance(d);
        }
    }
    dists
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    /// Committed (row, column) pairs.
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

impl AssignmentResult {
    fn unmatched(num_rows: usize, num_cols: usize) -> Self {
        Self {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: (0..num_cols).collect(),
        }
    }

    /// Build the result from committed matches, deriving the unmatched sets
    /// in ascending index order.
    fn from_matches(matches: Vec<(usize, usize)>, num_rows: usize, num_cols: usize) -> Self {
        let mut row_used = vec![false; num_rows];
        let mut col_used = vec![false; num_cols];
        for &(r, c) in &matches {
            row_used[r] = true;
            col_used[c] = true;
        }
        let unmatched_tracks = (0..num_rows).filter(|&r| !row_used[r]).collect();
        let unmatched_detections = (0..num_cols).filter(|&c| !col_used[c]).collect();
        Self {
            matches,
            unmatched_tracks,
            unmatched_detections,
        }
    }
}

/// Policy that pairs rows (tracks) with columns (detections) of a cost
/// matrix, never committing a pair whose cost exceeds `max_distance`.
pub trait AssignmentStrategy: fmt::Debug + Send {
    fn assign(&self, costs: &Array2<f64>, max_distance: f64) -> AssignmentResult;
}

/// Which built-in [`AssignmentStrategy`] a registry uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentKind {
    #[default]
    Greedy,
    Optimal,
}

impl AssignmentKind {
    pub fn strategy(self) -> Box<dyn AssignmentStrategy> {
        match self {
            Self::Greedy => Box::new(GreedyAssignment),
            Self::Optimal => Box::new(OptimalAssignment),
        }
    }
}

/// Single-pass greedy nearest-neighbour association.
///
/// Rows are visited in ascending order of their smallest cost (ties keep the
/// lower row first). Each row takes its arg-min column (the first minimum on
/// ties) if that column is still free and within `max_distance`. A row that
/// loses its best column is not retried against its second-best one, so
/// near-ties can swap identities. This is a known limitation of the
/// heuristic; use [`OptimalAssignment`] when that matters more than cost.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyAssignment;

impl AssignmentStrategy for GreedyAssignment {
    fn assign(&self, costs: &Array2<f64>, max_distance: f64) -> AssignmentResult {
        let (num_rows, num_cols) = costs.dim();
        if num_rows == 0 || num_cols == 0 {
            return AssignmentResult::unmatched(num_rows, num_cols);
        }

        let mut best: Vec<(usize, usize, f64)> = costs
            .outer_iter()
            .enumerate()
            .map(|(row, costs_row)| {
                let (col, cost) = arg_min(costs_row);
                (row, col, cost)
            })
            .collect();
        // Stable, so equal minima keep the older track first.
        best.sort_by(|a, b| a.2.total_cmp(&b.2));

        let mut col_used = vec![false; num_cols];
        let mut matches = Vec::new();
        for (row, col, cost) in best {
            if col_used[col] || cost > max_distance {
                continue;
            }
            col_used[col] = true;
            matches.push((row, col));
        }

        AssignmentResult::from_matches(matches, num_rows, num_cols)
    }
}

/// Index and value of the first minimum of a non-empty row.
fn arg_min(row: ArrayView1<'_, f64>) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (j, &cost) in row.iter().enumerate() {
        if cost < best.1 {
            best = (j, cost);
        }
    }
    best
}

/// Minimum-cost bipartite matching (Jonker-Volgenant) over the gated cost
/// matrix. Pairs beyond `max_distance` are never committed.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimalAssignment;

impl AssignmentStrategy for OptimalAssignment {
    fn assign(&self, costs: &Array2<f64>, max_distance: f64) -> AssignmentResult {
        let (num_rows, num_cols) = costs.dim();
        if num_rows == 0 || num_cols == 0 {
            return AssignmentResult::unmatched(num_rows, num_cols);
        }

        let size = num_rows.max(num_cols);
        let mut padded = Array2::<f64>::from_elem((size, size), GATED_COST);
        for ((i, j), &cost) in costs.indexed_iter() {
            if cost <= max_distance {
                padded[[i, j]] = cost;
            }
        }

        let row_to_col = match lapjv::lapjv(&padded) {
            Ok((row_to_col, _)) => row_to_col,
            Err(err) => {
                tracing::warn!(error = ?err, "optimal assignment failed, leaving frame unmatched");
                return AssignmentResult::unmatched(num_rows, num_cols);
            }
        };

        let matches = row_to_col
            .into_iter()
            .enumerate()
            .filter(|&(row, col)| {
                row < num_rows && col < num_cols && costs[[row, col]] <= max_distance
            })
            .collect();

        AssignmentResult::from_matches(matches, num_rows, num_cols)
    }
}
