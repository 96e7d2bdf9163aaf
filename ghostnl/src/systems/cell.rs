//! The `UnitCell` type represents the enclosing box of a simulated system,
//! with periodic boundary conditions along some or all of the cell vectors.
use crate::{Error, Matrix3, Vector3D};

/// An `UnitCell` defines the system physical boundaries: a lattice matrix and
/// which of the lattice vectors are periodic.
///
/// The rows of the matrix are the three lattice vectors `a`, `b` and `c`. A
/// periodic image of a point `r` is `r + s_a a + s_b b + s_c c` for integer
/// shifts `s`, with non-zero shifts only allowed along periodic axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCell {
    /// Unit cell matrix
    matrix: Matrix3,
    /// Inverse of the transpose of the unit cell matrix, cached from matrix
    inverse: Matrix3,
    /// Periodic boundary conditions along each lattice vector
    periodic: [bool; 3],
}

impl UnitCell {
    /// Create a new unit cell with the given lattice `matrix` and `periodic`
    /// boundary conditions.
    ///
    /// If any direction is periodic, the matrix must be invertible. If no
    /// direction is periodic the matrix is ignored, and the cell is equivalent
    /// to [`UnitCell::infinite`].
    pub fn new(matrix: Matrix3, periodic: [bool; 3]) -> Result<UnitCell, Error> {
        if !periodic.iter().any(|&p| p) {
            return Ok(UnitCell::infinite());
        }

        if !matrix.is_finite() {
            return Err(Error::Configuration(
                "the lattice matrix contains non finite values".into()
            ));
        }

        // scale the threshold with the size of the cell vectors, to accept
        // very small and very large cells alike
        let scale = matrix.row(0).norm() * matrix.row(1).norm() * matrix.row(2).norm();
        let determinant = matrix.determinant();
        if scale == 0.0 || f64::abs(determinant) <= 1e-12 * scale {
            return Err(Error::Configuration(format!(
                "the lattice matrix is degenerate (determinant = {}) but periodic boundary conditions are requested",
                determinant
            )));
        }

        return Ok(UnitCell {
            matrix: matrix,
            inverse: matrix.transposed().inverse(),
            periodic: periodic,
        });
    }

    /// Create an infinite unit cell, without any periodic boundary condition
    pub fn infinite() -> UnitCell {
        UnitCell {
            matrix: Matrix3::zero(),
            inverse: Matrix3::zero(),
            periodic: [false, false, false],
        }
    }

    /// Create a fully periodic orthorhombic unit cell, with side lengths `a, b,
    /// c`.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Result<UnitCell, Error> {
        let matrix = Matrix3::new([
            [a, 0.0, 0.0],
            [0.0, b, 0.0],
            [0.0, 0.0, c]
        ]);
        return UnitCell::new(matrix, [true, true, true]);
    }

    /// Create a fully periodic cubic unit cell, with side lengths `length,
    /// length, length`.
    pub fn cubic(length: f64) -> Result<UnitCell, Error> {
        UnitCell::orthorhombic(length, length, length)
    }

    /// Create a fully periodic triclinic unit cell, with side lengths `a, b,
    /// c` and angles `alpha, beta, gamma` in degrees.
    pub fn triclinic(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Result<UnitCell, Error> {
        let cos_alpha = alpha.to_radians().cos();
        let cos_beta = beta.to_radians().cos();
        let (sin_gamma, cos_gamma) = gamma.to_radians().sin_cos();

        let b_x = b * cos_gamma;
        let b_y = b * sin_gamma;

        let c_x = c * cos_beta;
        let c_y = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let c_z = f64::sqrt(c * c - c_y * c_y - c_x * c_x);

        return UnitCell::new(Matrix3::new([
            [a,   0.0, 0.0],
            [b_x, b_y, 0.0],
            [c_x, c_y, c_z],
        ]), [true, true, true]);
    }

    /// Get the lattice matrix, with the lattice vectors as rows
    pub fn matrix(&self) -> Matrix3 {
        self.matrix
    }

    /// Get the periodic boundary conditions along each lattice vector
    pub fn periodic(&self) -> [bool; 3] {
        self.periodic
    }

    /// Check if this unit cell is infinite, *i.e.* if it does not have
    /// periodic boundary conditions in any direction.
    pub fn is_infinite(&self) -> bool {
        !self.periodic.iter().any(|&p| p)
    }

    /// Get the distances between opposite faces of the unit cell
    pub fn distances_between_faces(&self) -> Vector3D {
        if self.is_infinite() {
            return Vector3D::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        }

        let (a, b, c) = (self.matrix.row(0), self.matrix.row(1), self.matrix.row(2));
        // Plans normal vectors
        let na = (b ^ c).normalized();
        let nb = (c ^ a).normalized();
        let nc = (a ^ b).normalized();

        Vector3D::new(f64::abs(na * a), f64::abs(nb * b), f64::abs(nc * c))
    }

    /// Get the fractional representation of the `vector` in this cell
    pub fn fractional(&self, vector: Vector3D) -> Vector3D {
        // this needs to use the inverse of the transpose of the matrix, since
        // we only have code to multiply a vector by a matrix on the left
        return self.inverse * vector;
    }

    /// Get the Cartesian representation of the `fractional` vector in this
    /// cell
    pub fn cartesian(&self, fractional: Vector3D) -> Vector3D {
        return self.matrix.transposed() * fractional;
    }

    /// Get the cartesian displacement corresponding to the periodic image
    /// `shift`, i.e. `shift[0] a + shift[1] b + shift[2] c`.
    pub fn shift_vector(&self, shift: [i32; 3]) -> Vector3D {
        let cell = &self.matrix;
        let x = cell[0][0] * shift[0] as f64 + cell[1][0] * shift[1] as f64 + cell[2][0] * shift[2] as f64;
        let y = cell[0][1] * shift[0] as f64 + cell[1][1] * shift[1] as f64 + cell[2][1] * shift[2] as f64;
        let z = cell[0][2] * shift[0] as f64 + cell[1][2] * shift[1] as f64 + cell[2][2] * shift[2] as f64;
        Vector3D::new(x, y, z)
    }
}
