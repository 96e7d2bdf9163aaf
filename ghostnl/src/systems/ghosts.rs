use log::debug;

use crate::{Error, Vector3D};
use super::{UnitCell, CellList};

/// Strategy used to decide which periodic images of the real atoms are
/// included as ghost atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GhostPadding {
    /// Only include periodic images which are within the influence distance
    /// of at least one real atom
    #[default]
    Minimal,
    /// Include all periodic images inside the bounding box of the real atoms
    /// (in fractional coordinates), grown by the influence distance along each
    /// periodic direction. This is a superset of the minimal padding, which
    /// does not require any distance computation.
    BoundingBox,
}

/// Periodic images of real atoms, created by [`generate_ghosts`].
///
/// The three vectors have the same length, the ghost atom `i` is the image of
/// the real atom `sources[i]` shifted by `shifts[i]` lattice vectors.
#[derive(Debug, Clone, Default)]
pub struct Ghosts {
    /// Cartesian positions of the ghost atoms
    pub positions: Vec<Vector3D>,
    /// Periodic image shift used to create each ghost atom
    pub shifts: Vec<[i32; 3]>,
    /// Index of the real atom each ghost atom is an image of
    pub sources: Vec<usize>,
}

impl Ghosts {
    /// Get the number of ghost atoms
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Are there no ghost atoms?
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Tolerance on fractional coordinates when selecting candidate image shifts,
/// making sure images at exactly the influence distance are considered.
const FRACTIONAL_TOLERANCE: f64 = 1e-8;

/// Maximal number of periodic images to consider for each atom, we need to
/// use this to prevent endless loops with a small unit cell and a large
/// influence distance
const MAX_IMAGES_PER_ATOM: f64 = 1e6;

/// Create the periodic images of the atoms at `positions` required for every
/// real atom to have all its neighbors up to `influence_distance` in the
/// extended set of real and ghost atoms.
///
/// Images are only created along the periodic directions of the `cell`. An
/// atom can have images of itself as ghosts when the cell is smaller than the
/// influence distance. The ghosts are created in a deterministic order: by
/// source atom, and then by increasing shift along `a`, `b` and `c`.
#[time_graph::instrument(name = "generate_ghosts")]
pub fn generate_ghosts(
    positions: &[Vector3D],
    cell: &UnitCell,
    influence_distance: f64,
    padding: GhostPadding,
) -> Result<Ghosts, Error> {
    if !(influence_distance > 0.0 && influence_distance.is_finite()) {
        return Err(Error::Configuration(format!(
            "influence distance must be a positive finite number, got {}", influence_distance
        )));
    }

    if let Some(i) = positions.iter().position(|p| !p.is_finite()) {
        return Err(Error::InvalidParameter(format!(
            "the position of atom {} is not finite", i
        )));
    }

    let mut ghosts = Ghosts::default();
    if cell.is_infinite() || positions.is_empty() {
        return Ok(ghosts);
    }

    let periodic = cell.periodic();
    let fractional = positions.iter().map(|&p| cell.fractional(p)).collect::<Vec<_>>();

    // bounding box of the real atoms in fractional coordinates, grown by the
    // influence distance along each periodic direction
    let distances_between_faces = cell.distances_between_faces();
    let mut lower = [0.0; 3];
    let mut upper = [0.0; 3];
    for xyz in 0..3 {
        if !periodic[xyz] {
            continue;
        }
        let min = fractional.iter().map(|f| f[xyz]).fold(f64::INFINITY, f64::min);
        let max = fractional.iter().map(|f| f[xyz]).fold(f64::NEG_INFINITY, f64::max);
        let ratio = influence_distance / distances_between_faces[xyz];
        lower[xyz] = min - ratio - FRACTIONAL_TOLERANCE;
        upper[xyz] = max + ratio + FRACTIONAL_TOLERANCE;
    }

    let n_images = (0..3)
        .map(|xyz| f64::floor(upper[xyz] - lower[xyz]) + 1.0)
        .product::<f64>();
    if n_images > MAX_IMAGES_PER_ATOM {
        return Err(Error::Configuration(format!(
            "the influence distance ({}) is too large for this unit cell, \
            it would require up to {:e} periodic images of each atom",
            influence_distance, n_images
        )));
    }

    let real_atoms = match padding {
        GhostPadding::Minimal => Some(CellList::new(positions, influence_distance)),
        GhostPadding::BoundingBox => None,
    };

    for (source, (&position, frac)) in positions.iter().zip(&fractional).enumerate() {
        let mut ranges = [(0, 0); 3];
        for xyz in 0..3 {
            if periodic[xyz] {
                ranges[xyz] = (
                    f64::ceil(lower[xyz] - frac[xyz]) as i32,
                    f64::floor(upper[xyz] - frac[xyz]) as i32,
                );
            }
        }

        for shift_a in ranges[0].0..=ranges[0].1 {
            for shift_b in ranges[1].0..=ranges[1].1 {
                for shift_c in ranges[2].0..=ranges[2].1 {
                    let shift = [shift_a, shift_b, shift_c];
                    if shift == [0, 0, 0] {
                        continue;
                    }

                    let image = position + cell.shift_vector(shift);
                    if let Some(ref real_atoms) = real_atoms {
                        if !real_atoms.any_within(image) {
                            continue;
                        }
                    }

                    ghosts.positions.push(image);
                    ghosts.shifts.push(shift);
                    ghosts.sources.push(source);
                }
            }
        }
    }

    debug!(
        "created {} ghost atoms for {} real atoms with influence distance {}",
        ghosts.len(), positions.len(), influence_distance
    );

    return Ok(ghosts);
}
