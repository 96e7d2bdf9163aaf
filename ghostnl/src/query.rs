use std::cell::Cell;
use std::os::raw::c_int;

use log::debug;

use crate::{Error, Vector3D, NeighborListOptions};
use crate::bridge::IndexBase;
use crate::systems::{UnitCell, ExtendedSystem, NeighborArrays};
use crate::systems::{generate_ghosts, build_neighbor_lists};

/// Source of neighbors for the engine during a compute call.
///
/// The engine sees an [`ExtendedSystem`] (real and ghost atoms) and requests
/// the neighbors of one particle in one of the neighbor lists at the time.
pub trait NeighborQuery {
    /// Get the cutoff of each neighbor list, in order
    fn cutoffs(&self) -> &[f64];

    /// Get the extended system (real and ghost atoms) the neighbor lists
    /// refer to
    fn system(&self) -> &ExtendedSystem;

    /// Get the index convention used for the output of [`NeighborQuery::query`]
    fn index_base(&self) -> IndexBase;

    /// Are the neighbor lists of ghost atoms available?
    fn ghost_neighbors(&self) -> bool;

    /// Get the distance from the real atoms up to which all periodic images
    /// are included in the system as ghost atoms
    fn influence_distance(&self) -> f64;

    /// Get the neighbors of `particle` (zero-based) in the neighbor list at
    /// index `list`, converted to the [`NeighborQuery::index_base`]
    /// convention.
    ///
    /// The returned buffer is owned by this object, and reused by the next
    /// call with the same `list`. Its address never changes.
    fn query(&self, list: usize, particle: usize) -> Result<&[Cell<c_int>], Error>;
}

/// Fixed-size buffers receiving the converted neighbors, one per list
#[derive(Debug)]
struct ScratchBuffers {
    buffers: Vec<Box<[Cell<c_int>]>>,
    index_base: IndexBase,
}

impl ScratchBuffers {
    fn new(lists: &[NeighborArrays], index_base: IndexBase) -> ScratchBuffers {
        let buffers = lists.iter()
            .map(|list| vec![Cell::new(0); list.max_neighbors()].into_boxed_slice())
            .collect();

        return ScratchBuffers {
            buffers: buffers,
            index_base: index_base,
        };
    }

    fn fill(&self, lists: &[NeighborArrays], list: usize, particle: usize) -> Result<&[Cell<c_int>], Error> {
        let neighbors = checked_neighbors(lists, list, particle)?;

        let buffer = &self.buffers[list];
        if neighbors.len() > buffer.len() {
            return Err(Error::Capacity(format!(
                "particle {} has {} neighbors in list {}, but the buffer can only contain {}",
                particle, neighbors.len(), list, buffer.len()
            )));
        }

        for (slot, &neighbor) in buffer.iter().zip(neighbors) {
            let neighbor = self.index_base.to_external(neighbor).ok_or_else(|| Error::Index(format!(
                "neighbor {} can not be represented as a C integer", neighbor
            )))?;
            slot.set(neighbor);
        }

        return Ok(&buffer[..neighbors.len()]);
    }
}

fn checked_neighbors(lists: &[NeighborArrays], list: usize, particle: usize) -> Result<&[usize], Error> {
    let arrays = lists.get(list).ok_or_else(|| Error::Index(format!(
        "neighbor list index {} is out of bounds, there are {} lists", list, lists.len()
    )))?;

    if particle >= arrays.len() {
        return Err(Error::Index(format!(
            "particle index {} is out of bounds, there are {} particles", particle, arrays.len()
        )));
    }

    return Ok(arrays.neighbors(particle));
}

/// Neighbor lists over a periodic system, using ghost atoms to represent the
/// periodic images of real atoms.
///
/// This is not `Sync`: queries write to internal buffers, and must come from
/// a single thread at the time.
#[derive(Debug)]
pub struct GhostNeighborList {
    options: NeighborListOptions,
    system: ExtendedSystem,
    shifts: Vec<[i32; 3]>,
    lists: Vec<NeighborArrays>,
    scratch: ScratchBuffers,
}

impl GhostNeighborList {
    /// Build the extended system and the neighbor lists for the atoms at
    /// `positions` in the given `cell`, following `options`.
    pub fn new(positions: &[Vector3D], cell: &UnitCell, options: NeighborListOptions) -> Result<GhostNeighborList, Error> {
        options.validate()?;

        let ghosts = generate_ghosts(positions, cell, options.influence_distance(), options.padding)?;
        let system = ExtendedSystem::new(positions, &ghosts)?;

        let needs_neighbors = (0..system.len())
            .map(|point| options.ghost_neighbors || system.is_real(point))
            .collect::<Vec<_>>();
        let lists = build_neighbor_lists(system.positions(), &options.cutoffs, &needs_neighbors)?;

        debug!(
            "built {} neighbor lists for {} real and {} ghost atoms",
            lists.len(), system.n_real(), system.n_ghosts()
        );

        let scratch = ScratchBuffers::new(&lists, options.index_base);
        return Ok(GhostNeighborList {
            options: options,
            system: system,
            shifts: ghosts.shifts,
            lists: lists,
            scratch: scratch,
        });
    }

    /// Get the options used to create these neighbor lists
    pub fn options(&self) -> &NeighborListOptions {
        &self.options
    }

    /// Get the periodic shift used to create each ghost atom
    pub fn ghost_shifts(&self) -> &[[i32; 3]] {
        &self.shifts
    }

    /// Get all the neighbor lists, one per cutoff
    pub fn lists(&self) -> &[NeighborArrays] {
        &self.lists
    }

    /// Get the zero-based neighbors of `particle` in the neighbor list at
    /// index `list`
    pub fn neighbors(&self, list: usize, particle: usize) -> Result<&[usize], Error> {
        checked_neighbors(&self.lists, list, particle)
    }
}

impl NeighborQuery for GhostNeighborList {
    fn cutoffs(&self) -> &[f64] {
        &self.options.cutoffs
    }

    fn system(&self) -> &ExtendedSystem {
        &self.system
    }

    fn index_base(&self) -> IndexBase {
        self.options.index_base
    }

    fn ghost_neighbors(&self) -> bool {
        self.options.ghost_neighbors
    }

    fn influence_distance(&self) -> f64 {
        self.options.influence_distance()
    }

    fn query(&self, list: usize, particle: usize) -> Result<&[Cell<c_int>], Error> {
        self.scratch.fill(&self.lists, list, particle)
    }
}

/// Neighbor lists computed outside of this crate, used as a replacement for
/// [`GhostNeighborList`].
#[derive(Debug)]
pub struct PrecomputedNeighbors {
    cutoffs: Vec<f64>,
    system: ExtendedSystem,
    lists: Vec<NeighborArrays>,
    ghost_neighbors: bool,
    influence_distance: f64,
    scratch: ScratchBuffers,
}

impl PrecomputedNeighbors {
    /// Use the given neighbor `lists` over `system`, where `lists[k][i]`
    /// contains the zero-based neighbors of point `i` for `cutoffs[k]`.
    ///
    /// The ghost atoms in `system` are assumed to cover the largest cutoff,
    /// use [`PrecomputedNeighbors::with_influence_distance`] if they go
    /// further.
    pub fn new(
        system: ExtendedSystem,
        cutoffs: Vec<f64>,
        lists: Vec<Vec<Vec<usize>>>,
        index_base: IndexBase,
    ) -> Result<PrecomputedNeighbors, Error> {
        let options = NeighborListOptions::new(cutoffs.clone());
        options.validate()?;

        if lists.len() != cutoffs.len() {
            return Err(Error::InvalidParameter(format!(
                "got {} neighbor lists for {} cutoffs", lists.len(), cutoffs.len()
            )));
        }

        for (list, per_point) in lists.iter().enumerate() {
            if per_point.len() != system.len() {
                return Err(Error::InvalidParameter(format!(
                    "neighbor list {} contains {} entries, expected one per point ({})",
                    list, per_point.len(), system.len()
                )));
            }

            for (point, neighbors) in per_point.iter().enumerate() {
                if let Some(&neighbor) = neighbors.iter().find(|&&n| n >= system.len()) {
                    return Err(Error::Index(format!(
                        "neighbor {} of point {} in list {} is out of bounds for {} points",
                        neighbor, point, list, system.len()
                    )));
                }
            }
        }

        let ghost_neighbors = lists.iter().any(|per_point| {
            per_point[system.n_real()..].iter().any(|neighbors| !neighbors.is_empty())
        });

        let lists = cutoffs.iter().zip(&lists)
            .map(|(&cutoff, per_point)| NeighborArrays::from_lists(cutoff, per_point))
            .collect::<Vec<_>>();

        let scratch = ScratchBuffers::new(&lists, index_base);
        return Ok(PrecomputedNeighbors {
            cutoffs: cutoffs,
            system: system,
            lists: lists,
            ghost_neighbors: ghost_neighbors,
            influence_distance: options.max_cutoff(),
            scratch: scratch,
        });
    }

    /// Set the distance up to which all periodic images of the real atoms
    /// are included in the system. This can not be smaller than the largest
    /// cutoff.
    pub fn with_influence_distance(mut self, influence_distance: f64) -> Result<PrecomputedNeighbors, Error> {
        let mut options = NeighborListOptions::new(self.cutoffs.clone());
        options.influence_distance = Some(influence_distance);
        options.validate()?;

        self.influence_distance = influence_distance;
        return Ok(self);
    }
}

impl NeighborQuery for PrecomputedNeighbors {
    fn cutoffs(&self) -> &[f64] {
        &self.cutoffs
    }

    fn system(&self) -> &ExtendedSystem {
        &self.system
    }

    fn index_base(&self) -> IndexBase {
        self.scratch.index_base
    }

    fn ghost_neighbors(&self) -> bool {
        self.ghost_neighbors
    }

    fn influence_distance(&self) -> f64 {
        self.influence_distance
    }

    fn query(&self, list: usize, particle: usize) -> Result<&[Cell<c_int>], Error> {
        self.scratch.fill(&self.lists, list, particle)
    }
}

#[cfg(test)]
mod tests {
    use crate::systems::{GhostPadding, test_utils::test_system};
    use super::*;

    fn values(buffer: &[Cell<c_int>]) -> Vec<c_int> {
        buffer.iter().map(Cell::get).collect()
    }

    #[test]
    fn dimer() {
        let (positions, cell) = test_system("dimer");
        let neighbors = GhostNeighborList::new(&positions, &cell, NeighborListOptions::new(vec![1.5])).unwrap();

        assert_eq!(neighbors.system().n_ghosts(), 0);
        assert_eq!(neighbors.neighbors(0, 0).unwrap(), [1]);
        assert_eq!(neighbors.neighbors(0, 1).unwrap(), [0]);
        assert_eq!(values(neighbors.query(0, 0).unwrap()), [1]);
        assert_eq!(values(neighbors.query(0, 1).unwrap()), [0]);

        assert!(matches!(neighbors.neighbors(1, 0), Err(Error::Index(_))));
        assert!(matches!(neighbors.query(0, 2), Err(Error::Index(_))));
    }

    #[test]
    fn methane() {
        let (positions, cell) = test_system("methane");
        let neighbors = GhostNeighborList::new(&positions, &cell, NeighborListOptions::new(vec![1.5])).unwrap();

        // the molecule is far from its periodic images
        assert_eq!(neighbors.system().n_ghosts(), 0);
        assert_eq!(neighbors.neighbors(0, 0).unwrap(), [1, 2, 3, 4]);
        for hydrogen in 1..5 {
            assert_eq!(neighbors.neighbors(0, hydrogen).unwrap(), [0]);
        }
    }

    #[test]
    fn self_images() {
        let (positions, cell) = test_system("single");
        let neighbors = GhostNeighborList::new(&positions, &cell, NeighborListOptions::new(vec![3.0])).unwrap();

        let system = neighbors.system();
        assert_eq!(system.n_real(), 1);
        assert_eq!(system.n_ghosts(), 18);
        assert_eq!(neighbors.ghost_shifts().len(), 18);
        assert!(system.image_of().iter().all(|&image| image == 0));

        // the atom only has neighbors which are images of itself
        let list = neighbors.neighbors(0, 0).unwrap();
        assert_eq!(list.len(), 18);
        assert!(list.iter().all(|&n| !system.is_real(n)));

        // ghosts do not have neighbors by default
        for ghost in 1..system.len() {
            assert!(neighbors.neighbors(0, ghost).unwrap().is_empty());
        }

        let mut options = NeighborListOptions::new(vec![3.0]);
        options.padding = GhostPadding::BoundingBox;
        let neighbors = GhostNeighborList::new(&positions, &cell, options).unwrap();
        assert_eq!(neighbors.system().n_ghosts(), 26);
        assert_eq!(neighbors.neighbors(0, 0).unwrap().len(), 18);
    }

    #[test]
    fn ghost_neighbors() {
        let (positions, cell) = test_system("NaCl");
        let mut options = NeighborListOptions::new(vec![1.2]);
        options.ghost_neighbors = true;
        let neighbors = GhostNeighborList::new(&positions, &cell, options).unwrap();
        assert!(neighbors.ghost_neighbors());

        let system = neighbors.system();
        assert!(system.n_ghosts() > 0);

        let mut n_ghost_pairs = 0;
        for ghost in system.n_real()..system.len() {
            for &neighbor in neighbors.neighbors(0, ghost).unwrap() {
                let distance = (system.positions()[ghost] - system.positions()[neighbor]).norm();
                assert!(distance <= 1.2);
                n_ghost_pairs += 1;
            }
        }
        assert!(n_ghost_pairs > 0);
    }

    #[test]
    fn precomputed() {
        let system = ExtendedSystem::from_parts(
            vec![Vector3D::zero(), Vector3D::new(1.0, 0.0, 0.0), Vector3D::new(-1.0, 0.0, 0.0)],
            vec![0, 1, 1],
            2,
        ).unwrap();

        let lists = vec![vec![vec![1, 2], vec![0], vec![]]];
        let neighbors = PrecomputedNeighbors::new(system, vec![1.1], lists, IndexBase::One).unwrap();
        assert_eq!(neighbors.cutoffs(), [1.1]);
        assert!(!neighbors.ghost_neighbors());
        assert_eq!(neighbors.influence_distance(), 1.1);
        assert_eq!(values(neighbors.query(0, 0).unwrap()), [2, 3]);
        assert_eq!(values(neighbors.query(0, 1).unwrap()), [1]);
        assert!(neighbors.query(0, 2).unwrap().is_empty());
        assert!(matches!(neighbors.query(1, 0), Err(Error::Index(_))));
    }

    #[test]
    fn invalid_precomputed() {
        let system = ExtendedSystem::from_parts(vec![Vector3D::zero(); 2], vec![0, 1], 2).unwrap();

        let error = PrecomputedNeighbors::new(system.clone(), vec![1.0], vec![], IndexBase::Zero).unwrap_err();
        assert!(matches!(error, Error::InvalidParameter(_)));

        let error = PrecomputedNeighbors::new(system.clone(), vec![1.0], vec![vec![vec![1]]], IndexBase::Zero).unwrap_err();
        assert!(matches!(error, Error::InvalidParameter(_)));

        let error = PrecomputedNeighbors::new(system.clone(), vec![1.0], vec![vec![vec![2], vec![]]], IndexBase::Zero).unwrap_err();
        assert!(matches!(error, Error::Index(_)));

        let error = PrecomputedNeighbors::new(system.clone(), vec![], vec![], IndexBase::Zero).unwrap_err();
        assert!(matches!(error, Error::Configuration(_)));

        let neighbors = PrecomputedNeighbors::new(system, vec![1.0], vec![vec![vec![1], vec![0]]], IndexBase::Zero).unwrap();
        let error = neighbors.with_influence_distance(0.5).unwrap_err();
        assert!(matches!(error, Error::Configuration(_)));
    }

    #[test]
    fn influence_distance() {
        let (positions, cell) = test_system("NaCl");
        let neighbors = GhostNeighborList::new(&positions, &cell, NeighborListOptions::new(vec![1.5, 2.5])).unwrap();
        assert_eq!(neighbors.influence_distance(), 2.5);

        let mut options = NeighborListOptions::new(vec![1.5]);
        options.influence_distance = Some(4.0);
        let neighbors = GhostNeighborList::new(&positions, &cell, options).unwrap();
        assert_eq!(neighbors.influence_distance(), 4.0);

        let system = ExtendedSystem::from_parts(vec![Vector3D::zero(); 2], vec![0, 1], 2).unwrap();
        let neighbors = PrecomputedNeighbors::new(system, vec![1.0], vec![vec![vec![1], vec![0]]], IndexBase::Zero)
            .and_then(|neighbors| neighbors.with_influence_distance(3.0))
            .unwrap();
        assert_eq!(neighbors.influence_distance(), 3.0);
    }
}
