use log::{debug, warn};

use crate::{Error, Vector3D};
use super::CellList;

/// Neighbor list for a single cutoff, stored in compressed sparse row format:
/// the neighbors of point `i` are `neighbors[offsets[i]..offsets[i + 1]]`.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborArrays {
    /// the cutoff used to create this neighbor list
    cutoff: f64,
    /// start of the neighbors of each point in `neighbors`, with one
    /// additional entry at the end
    offsets: Vec<usize>,
    /// neighbors of all points, sorted by increasing index for each point
    neighbors: Vec<usize>,
}

impl NeighborArrays {
    /// Create a new neighbor list from per-point neighbors
    pub fn from_lists(cutoff: f64, lists: &[Vec<usize>]) -> NeighborArrays {
        let mut offsets = Vec::with_capacity(lists.len() + 1);
        let mut neighbors = Vec::with_capacity(lists.iter().map(Vec::len).sum());
        offsets.push(0);
        for list in lists {
            neighbors.extend_from_slice(list);
            offsets.push(neighbors.len());
        }

        return NeighborArrays {
            cutoff: cutoff,
            offsets: offsets,
            neighbors: neighbors,
        };
    }

    /// Get the cutoff used to create this neighbor list
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Get the number of points in this neighbor list, including the ones
    /// without neighbors
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Is this neighbor list empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the neighbors of `point`. This function panics if `point` is out
    /// of bounds.
    pub fn neighbors(&self, point: usize) -> &[usize] {
        let start = self.offsets[point];
        let stop = self.offsets[point + 1];
        return &self.neighbors[start..stop];
    }

    /// Get the largest number of neighbors of a single point
    pub fn max_neighbors(&self) -> usize {
        self.offsets.windows(2).map(|w| w[1] - w[0]).max().unwrap_or(0)
    }

    /// Get the total number of (directed) neighbor pairs in this list
    pub fn n_pairs(&self) -> usize {
        self.neighbors.len()
    }
}

/// Build one neighbor list for each of the `cutoffs`, over all the
/// `positions`.
///
/// The neighbors of point `i` are all the points `j != i` with
/// `distance(i, j) <= cutoff`. Neighbors are only searched for points where
/// `needs_neighbors` is `true`, all other points get an empty list. A single
/// spatial search is done with the largest cutoff, smaller cutoffs select a
/// subset of the same candidates.
#[time_graph::instrument(name = "build_neighbor_lists")]
pub fn build_neighbor_lists(
    positions: &[Vector3D],
    cutoffs: &[f64],
    needs_neighbors: &[bool],
) -> Result<Vec<NeighborArrays>, Error> {
    if needs_neighbors.len() != positions.len() {
        return Err(Error::InvalidParameter(format!(
            "expected {} values in needs_neighbors, got {}",
            positions.len(), needs_neighbors.len()
        )));
    }

    if cutoffs.is_empty() {
        return Err(Error::Configuration("the set of cutoffs is empty".into()));
    }

    if let Some(cutoff) = cutoffs.iter().find(|&&c| !(c > 0.0 && c.is_finite())) {
        return Err(Error::Configuration(format!(
            "cutoffs must be positive finite numbers, got {}", cutoff
        )));
    }

    let max_cutoff = cutoffs.iter().copied().fold(0.0, f64::max);
    let cutoffs2 = cutoffs.iter().map(|c| c * c).collect::<Vec<_>>();
    let cell_list = CellList::new(positions, max_cutoff);

    let mut lists = vec![vec![Vec::new(); positions.len()]; cutoffs.len()];
    let mut candidates = Vec::new();
    for (center, &position) in positions.iter().enumerate() {
        if !needs_neighbors[center] {
            continue;
        }

        candidates.clear();
        cell_list.for_each_within(position, |neighbor, distance2| {
            if neighbor != center {
                candidates.push((neighbor, distance2));
            }
        });
        candidates.sort_unstable_by_key(|&(neighbor, _)| neighbor);

        for &(neighbor, distance2) in &candidates {
            if neighbor > center && distance2 < 1e-6 {
                warn!(
                    "atoms {} and {} are very close to one another ({})",
                    center, neighbor, distance2.sqrt()
                );
            }

            for (list, &cutoff2) in lists.iter_mut().zip(&cutoffs2) {
                if distance2 <= cutoff2 {
                    list[center].push(neighbor);
                }
            }
        }
    }

    let arrays = cutoffs.iter().zip(&lists)
        .map(|(&cutoff, lists)| NeighborArrays::from_lists(cutoff, lists))
        .collect::<Vec<_>>();

    for array in &arrays {
        debug!(
            "neighbor list with cutoff {}: {} pairs, at most {} neighbors per atom",
            array.cutoff(), array.n_pairs(), array.max_neighbors()
        );
    }

    return Ok(arrays);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize, spacing: f64) -> Vec<Vector3D> {
        (0..n).map(|i| Vector3D::new(i as f64 * spacing, 0.0, 0.0)).collect()
    }

    #[test]
    fn csr_storage() {
        let arrays = NeighborArrays::from_lists(2.0, &[vec![1, 2], vec![], vec![0]]);
        assert_eq!(arrays.cutoff(), 2.0);
        assert_eq!(arrays.len(), 3);
        assert_eq!(arrays.neighbors(0), [1, 2]);
        assert!(arrays.neighbors(1).is_empty());
        assert_eq!(arrays.neighbors(2), [0]);
        assert_eq!(arrays.max_neighbors(), 2);
        assert_eq!(arrays.n_pairs(), 3);

        let empty = NeighborArrays::from_lists(2.0, &[]);
        assert!(empty.is_empty());
        assert_eq!(empty.max_neighbors(), 0);
    }

    #[test]
    fn inclusive_cutoff() {
        let positions = line(3, 1.0);
        let lists = build_neighbor_lists(&positions, &[1.0], &[true; 3]).unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].neighbors(0), [1]);
        assert_eq!(lists[0].neighbors(1), [0, 2]);
        assert_eq!(lists[0].neighbors(2), [1]);
    }

    #[test]
    fn multiple_cutoffs() {
        let positions = line(4, 1.0);
        let lists = build_neighbor_lists(&positions, &[1.5, 2.5], &[true; 4]).unwrap();

        assert_eq!(lists[0].neighbors(0), [1]);
        assert_eq!(lists[1].neighbors(0), [1, 2]);
        assert_eq!(lists[0].neighbors(1), [0, 2]);
        assert_eq!(lists[1].neighbors(1), [0, 2, 3]);

        for point in 0..4 {
            let small = lists[0].neighbors(point);
            let large = lists[1].neighbors(point);
            assert!(small.iter().all(|n| large.contains(n)));
            assert!(large.len() > small.len());
        }
    }

    #[test]
    fn skip_points() {
        let positions = line(3, 1.0);
        let lists = build_neighbor_lists(&positions, &[1.5], &[true, false, true]).unwrap();
        assert_eq!(lists[0].len(), 3);
        assert_eq!(lists[0].neighbors(0), [1]);
        assert!(lists[0].neighbors(1).is_empty());
        assert_eq!(lists[0].neighbors(2), [1]);
    }

    #[test]
    fn overlapping_points() {
        // points at the same position are still neighbors of one another
        let positions = [Vector3D::zero(), Vector3D::zero()];
        let lists = build_neighbor_lists(&positions, &[1.0], &[true; 2]).unwrap();
        assert_eq!(lists[0].neighbors(0), [1]);
        assert_eq!(lists[0].neighbors(1), [0]);
    }

    #[test]
    fn invalid_parameters() {
        let positions = line(3, 1.0);

        let error = build_neighbor_lists(&positions, &[], &[true; 3]).unwrap_err();
        assert!(matches!(error, Error::Configuration(_)));

        let error = build_neighbor_lists(&positions, &[1.0, -1.0], &[true; 3]).unwrap_err();
        assert!(matches!(error, Error::Configuration(_)));

        let error = build_neighbor_lists(&positions, &[1.0], &[true; 2]).unwrap_err();
        assert!(matches!(error, Error::InvalidParameter(_)));
    }

    #[test]
    fn no_points() {
        let lists = build_neighbor_lists(&[], &[1.0, 2.0], &[]).unwrap();
        assert_eq!(lists.len(), 2);
        assert!(lists.iter().all(NeighborArrays::is_empty));
    }
}
