use std::marker::PhantomData;
use std::os::raw::{c_int, c_void};

use log::debug;

use crate::{Error, Vector3D, NeighborQuery, NeighborListOptions};
use crate::bridge::{self, CallbackContext, GetNeighborsFn, IndexBase};
use crate::systems::GhostPadding;

/// Neighbor lists required by an engine to compute energy and forces
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborRequirements {
    /// Distance up to which ghost atoms must be created. This can be larger
    /// than the largest cutoff, for example for many-body potentials
    pub influence_distance: f64,
    /// Cutoff of each neighbor list, in the order used by the engine
    pub cutoffs: Vec<f64>,
    /// Will the engine request neighbors of ghost atoms?
    pub ghost_neighbors: bool,
    /// Index convention used by the engine
    pub index_base: IndexBase,
}

impl NeighborRequirements {
    /// Get the options to build neighbor lists matching these requirements
    pub fn options(&self, padding: GhostPadding) -> NeighborListOptions {
        NeighborListOptions {
            cutoffs: self.cutoffs.clone(),
            influence_distance: Some(self.influence_distance),
            ghost_neighbors: self.ghost_neighbors,
            index_base: self.index_base,
            padding: padding,
        }
    }
}

/// Interface to an external energy and forces evaluation engine
pub trait Engine {
    /// Get the neighbor lists this engine needs
    fn neighbor_requirements(&self) -> NeighborRequirements;

    /// Compute the quantities requested in `arguments`, using the
    /// neighbors given by `arguments.neighbors`.
    ///
    /// Energies should only include contributions from particles with a
    /// non-zero contributing flag, while forces and per-particle energies are
    /// accumulated on all particles, including ghosts.
    fn compute(&mut self, arguments: &mut ComputeArguments<'_>) -> Result<(), Error>;
}

/// Access to the neighbor callback during a compute call
pub struct NeighborCallback<'a> {
    function: GetNeighborsFn,
    data: *mut c_void,
    cutoffs: &'a [f64],
    index_base: IndexBase,
    _context: PhantomData<&'a CallbackContext<'a>>,
}

impl<'a> NeighborCallback<'a> {
    fn new(context: &'a CallbackContext<'a>) -> NeighborCallback<'a> {
        let query = context.query();
        NeighborCallback {
            function: bridge::get_neighbors,
            data: context.as_ptr(),
            cutoffs: query.cutoffs(),
            index_base: query.index_base(),
            _context: PhantomData,
        }
    }

    /// Get the raw callback and the associated data pointer, to give to
    /// foreign code. Both are only valid during the current compute call.
    pub fn raw(&self) -> (GetNeighborsFn, *mut c_void) {
        (self.function, self.data)
    }

    /// Get the cutoff of each neighbor list
    pub fn cutoffs(&self) -> &'a [f64] {
        self.cutoffs
    }

    /// Get the index convention used for particles and neighbors
    pub fn index_base(&self) -> IndexBase {
        self.index_base
    }

    /// Get the neighbors of `particle` in the neighbor list at index `list`,
    /// going through the raw callback. Both `particle` and the returned
    /// neighbors use the [`NeighborCallback::index_base`] convention.
    pub fn get(&mut self, list: usize, particle: c_int) -> Result<&[c_int], Error> {
        let n_lists = c_int::try_from(self.cutoffs.len()).map_err(|_| Error::InvalidParameter(
            "too many neighbor lists".into()
        ))?;
        let list_index = c_int::try_from(list).map_err(|_| Error::Index(format!(
            "neighbor list index {} is too large", list
        )))?;

        let mut n_neighbors = 0;
        let mut neighbors = std::ptr::null();
        let status = unsafe {
            (self.function)(
                self.data,
                n_lists,
                self.cutoffs.as_ptr(),
                list_index,
                particle,
                &mut n_neighbors,
                &mut neighbors,
            )
        };

        if status != bridge::GET_NEIGHBORS_SUCCESS {
            return Err(Error::External {
                status: status,
                message: format!("failed to get neighbors of particle {} in list {}", particle, list),
            });
        }

        if n_neighbors == 0 || neighbors.is_null() {
            return Ok(&[]);
        }

        // the buffer stays untouched until the next call to this function,
        // which needs a mutable borrow of self
        let neighbors = unsafe {
            std::slice::from_raw_parts(neighbors, n_neighbors as usize)
        };
        return Ok(neighbors);
    }
}

/// Inputs and outputs of a compute call. Outputs which are `None` are not
/// requested.
pub struct ComputeArguments<'a> {
    /// Positions of all particles, real and ghost atoms
    pub positions: &'a [Vector3D],
    /// Contributing flag of all particles, 1 for real atoms and 0 for ghosts
    pub contributing: &'a [c_int],
    /// Neighbor lists callback
    pub neighbors: NeighborCallback<'a>,
    /// Total energy
    pub energy: Option<&'a mut f64>,
    /// Forces acting on all particles
    pub forces: Option<&'a mut [Vector3D]>,
    /// Energy of all particles
    pub particle_energy: Option<&'a mut [f64]>,
    /// Virial, in Voigt order (xx, yy, zz, yz, xz, xy)
    pub virial: Option<&'a mut [f64; 6]>,
}

impl ComputeArguments<'_> {
    /// Get the number of particles, real and ghost atoms
    pub fn n_particles(&self) -> usize {
        self.positions.len()
    }
}

/// Quantities to compute in [`compute`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComputeRequest {
    pub energy: bool,
    pub forces: bool,
    pub particle_energy: bool,
    pub virial: bool,
}

impl ComputeRequest {
    /// Request all quantities
    pub fn all() -> ComputeRequest {
        ComputeRequest {
            energy: true,
            forces: true,
            particle_energy: true,
            virial: true,
        }
    }
}

/// Results of [`compute`]. Forces and per-particle energies only contain
/// values for the real atoms, with contributions from ghost atoms added to
/// the corresponding real atom.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComputeOutput {
    pub energy: Option<f64>,
    pub forces: Option<Vec<Vector3D>>,
    pub particle_energy: Option<Vec<f64>>,
    pub virial: Option<[f64; 6]>,
}

/// Check that the neighbor lists in `neighbors` match what `engine` requires
fn check_requirements(requirements: &NeighborRequirements, neighbors: &dyn NeighborQuery) -> Result<(), Error> {
    if requirements.cutoffs != neighbors.cutoffs() {
        return Err(Error::Configuration(format!(
            "the engine requires neighbor lists with cutoffs {:?}, but the neighbor lists use {:?}",
            requirements.cutoffs, neighbors.cutoffs()
        )));
    }

    if requirements.index_base != neighbors.index_base() {
        return Err(Error::Configuration(format!(
            "the engine uses {:?}-based indexing, but the neighbor lists use {:?}-based indexing",
            requirements.index_base, neighbors.index_base()
        )));
    }

    if requirements.ghost_neighbors && !neighbors.ghost_neighbors() {
        return Err(Error::Configuration(
            "the engine requires neighbors of ghost atoms, but they are not available".into()
        ));
    }

    if neighbors.influence_distance() < requirements.influence_distance {
        return Err(Error::Configuration(format!(
            "the engine requires ghost atoms up to {}, but they were only created up to {}",
            requirements.influence_distance, neighbors.influence_distance()
        )));
    }

    Ok(())
}

/// Run `engine` on the system and neighbor lists from `neighbors`, computing
/// the quantities in `request`.
///
/// The neighbor callback given to the engine is only valid during this call.
/// Forces and per-particle energies are reduced onto the real atoms after the
/// engine returns.
pub fn compute(engine: &mut dyn Engine, neighbors: &dyn NeighborQuery, request: ComputeRequest) -> Result<ComputeOutput, Error> {
    let requirements = engine.neighbor_requirements();
    check_requirements(&requirements, neighbors)?;

    let system = neighbors.system();
    let n_particles = system.len();

    let mut energy = 0.0;
    let mut forces = vec![Vector3D::zero(); if request.forces { n_particles } else { 0 }];
    let mut particle_energy = vec![0.0; if request.particle_energy { n_particles } else { 0 }];
    let mut virial = [0.0; 6];

    debug!(
        "running compute for {} real atoms and {} ghost atoms",
        system.n_real(), system.n_ghosts()
    );

    {
        let context = CallbackContext::new(neighbors);
        let mut arguments = ComputeArguments {
            positions: system.positions(),
            contributing: system.contributing(),
            neighbors: NeighborCallback::new(&context),
            energy: request.energy.then_some(&mut energy),
            forces: request.forces.then_some(&mut forces[..]),
            particle_energy: request.particle_energy.then_some(&mut particle_energy[..]),
            virial: request.virial.then_some(&mut virial),
        };

        engine.compute(&mut arguments)?;
    }

    let mut output = ComputeOutput::default();
    if request.energy {
        output.energy = Some(energy);
    }

    if request.forces {
        output.forces = Some(system.reduce(&forces)?);
    }

    if request.particle_energy {
        output.particle_energy = Some(system.reduce(&particle_energy)?);
    }

    if request.virial {
        output.virial = Some(virial);
    }

    return Ok(output);
}
