use std::ops::AddAssign;
use std::os::raw::c_int;

use crate::{Error, Vector3D};
use super::Ghosts;

/// A set of real atoms extended with their periodic images (ghost atoms).
///
/// Real atoms come first, in the same order as they were given, followed by
/// the ghost atoms. For each point, this tracks the real atom it represents
/// and whether it contributes to the energy and forces.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedSystem {
    positions: Vec<Vector3D>,
    image_of: Vec<usize>,
    contributing: Vec<c_int>,
    n_real: usize,
}

impl ExtendedSystem {
    /// Create an extended system from the real atoms `positions` and the
    /// corresponding `ghosts`
    pub fn new(positions: &[Vector3D], ghosts: &Ghosts) -> Result<ExtendedSystem, Error> {
        let mut image_of = (0..positions.len()).collect::<Vec<_>>();
        image_of.extend_from_slice(&ghosts.sources);

        let mut all_positions = positions.to_vec();
        all_positions.extend_from_slice(&ghosts.positions);

        return ExtendedSystem::from_parts(all_positions, image_of, positions.len());
    }

    /// Create an extended system from all the points positions, the real atom
    /// each point is an image of, and the number of real atoms.
    ///
    /// The first `n_real` points must be images of themselves, and all other
    /// points must be images of one of the first `n_real` points.
    pub fn from_parts(positions: Vec<Vector3D>, image_of: Vec<usize>, n_real: usize) -> Result<ExtendedSystem, Error> {
        if positions.len() != image_of.len() {
            return Err(Error::InvalidParameter(format!(
                "got {} positions but {} image indexes", positions.len(), image_of.len()
            )));
        }

        if n_real > positions.len() {
            return Err(Error::InvalidParameter(format!(
                "the number of real atoms ({}) is larger than the number of points ({})",
                n_real, positions.len()
            )));
        }

        if c_int::try_from(positions.len()).is_err() {
            return Err(Error::InvalidParameter(format!(
                "too many points ({}) to be indexed with C integers", positions.len()
            )));
        }

        if let Some(i) = positions.iter().position(|p| !p.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "the position of point {} is not finite", i
            )));
        }

        for (point, &image) in image_of.iter().enumerate() {
            if point < n_real && image != point {
                return Err(Error::InvalidParameter(format!(
                    "real atom {} must be an image of itself, got {}", point, image
                )));
            } else if image >= n_real {
                return Err(Error::Index(format!(
                    "point {} is an image of atom {}, but there are only {} real atoms",
                    point, image, n_real
                )));
            }
        }

        let contributing = (0..positions.len())
            .map(|point| c_int::from(point < n_real))
            .collect();

        return Ok(ExtendedSystem {
            positions: positions,
            image_of: image_of,
            contributing: contributing,
            n_real: n_real,
        });
    }

    /// Get the total number of points, real and ghost atoms
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Is this system empty?
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Get the number of real atoms
    pub fn n_real(&self) -> usize {
        self.n_real
    }

    /// Get the number of ghost atoms
    pub fn n_ghosts(&self) -> usize {
        self.positions.len() - self.n_real
    }

    /// Get the positions of all points
    pub fn positions(&self) -> &[Vector3D] {
        &self.positions
    }

    /// Get the index of the real atom each point is an image of
    pub fn image_of(&self) -> &[usize] {
        &self.image_of
    }

    /// Get the contributing flag of all points: 1 for real atoms and 0 for
    /// ghost atoms
    pub fn contributing(&self) -> &[c_int] {
        &self.contributing
    }

    /// Is `point` a real atom?
    pub fn is_real(&self, point: usize) -> bool {
        point < self.n_real
    }

    /// Fold per-point `values` back onto the real atoms, see
    /// [`crate::reduce`].
    pub fn reduce<T>(&self, values: &[T]) -> Result<Vec<T>, Error>
        where T: Copy + Default + AddAssign
    {
        crate::reduce(values, &self.image_of, self.n_real)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_first() {
        let positions = [Vector3D::new(0.0, 0.0, 0.0), Vector3D::new(1.0, 0.0, 0.0)];
        let ghosts = Ghosts {
            positions: vec![Vector3D::new(3.0, 0.0, 0.0), Vector3D::new(-2.0, 0.0, 0.0)],
            shifts: vec![[1, 0, 0], [-1, 0, 0]],
            sources: vec![0, 1],
        };

        let system = ExtendedSystem::new(&positions, &ghosts).unwrap();
        assert_eq!(system.len(), 4);
        assert_eq!(system.n_real(), 2);
        assert_eq!(system.n_ghosts(), 2);
        assert_eq!(system.positions()[..2], positions);
        assert_eq!(system.positions()[2], Vector3D::new(3.0, 0.0, 0.0));
        assert_eq!(system.image_of(), [0, 1, 0, 1]);
        assert_eq!(system.contributing(), [1, 1, 0, 0]);
        assert_eq!(system.contributing().iter().sum::<c_int>(), 2);
        assert!(system.is_real(1));
        assert!(!system.is_real(2));

        let reduced = system.reduce(&[1.0, 2.0, 10.0, 20.0]).unwrap();
        assert_eq!(reduced, [11.0, 22.0]);
    }

    #[test]
    fn invalid_parts() {
        let positions = vec![Vector3D::zero(); 3];

        let error = ExtendedSystem::from_parts(positions.clone(), vec![0, 1], 2).unwrap_err();
        assert!(matches!(error, Error::InvalidParameter(_)));

        let error = ExtendedSystem::from_parts(positions.clone(), vec![0, 1, 2], 4).unwrap_err();
        assert!(matches!(error, Error::InvalidParameter(_)));

        let error = ExtendedSystem::from_parts(positions.clone(), vec![1, 0, 0], 2).unwrap_err();
        assert!(matches!(error, Error::InvalidParameter(_)));

        let error = ExtendedSystem::from_parts(positions.clone(), vec![0, 1, 2], 2).unwrap_err();
        assert!(matches!(error, Error::Index(_)));

        let error = ExtendedSystem::from_parts(
            vec![Vector3D::new(0.0, f64::INFINITY, 0.0)], vec![0], 1
        ).unwrap_err();
        assert!(matches!(error, Error::InvalidParameter(_)));

        let system = ExtendedSystem::from_parts(positions, vec![0, 0, 0], 1).unwrap();
        assert_eq!(system.contributing(), [1, 0, 0]);
    }
}
