#![allow(dead_code)]

use ghostnl::{Matrix3, UnitCell, Vector3D};

/// Deterministic pseudo-random positions inside the parallelepiped defined by
/// `cell`, using a linear congruential generator
pub fn random_positions(n_atoms: usize, cell: &Matrix3, seed: u64) -> Vec<Vector3D> {
    let mut state = seed;
    let mut next = || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    let cell = UnitCell::new(*cell, [true, true, true]).expect("invalid cell");
    return (0..n_atoms)
        .map(|_| cell.cartesian(Vector3D::new(next(), next(), next())))
        .collect();
}

/// Positions on a `n_cells[0] x n_cells[1] x n_cells[2]` grid in fractional
/// coordinates of `cell`, each displaced by up to `jitter` (also in
/// fractional coordinates)
pub fn lattice_positions(cell: &Matrix3, n_cells: [usize; 3], jitter: f64, seed: u64) -> Vec<Vector3D> {
    let n_atoms = n_cells[0] * n_cells[1] * n_cells[2];
    let noise = random_positions(n_atoms, &Matrix3::one(), seed);
    let cell = UnitCell::new(*cell, [true, true, true]).expect("invalid cell");

    let mut positions = Vec::with_capacity(n_atoms);
    for i in 0..n_cells[0] {
        for j in 0..n_cells[1] {
            for k in 0..n_cells[2] {
                let fractional = Vector3D::new(
                    i as f64 / n_cells[0] as f64,
                    j as f64 / n_cells[1] as f64,
                    k as f64 / n_cells[2] as f64,
                );
                let displacement = (noise[positions.len()] - Vector3D::new(0.5, 0.5, 0.5)) * (2.0 * jitter);
                positions.push(cell.cartesian(fractional + displacement));
            }
        }
    }
    return positions;
}

/// Triclinic cell used in multiple tests
pub fn triclinic_matrix() -> Matrix3 {
    Matrix3::new([
        [4.0, 0.0, 0.0],
        [1.2, 3.5, 0.0],
        [-0.7, 0.9, 4.4],
    ])
}

/// All the periodic images of the atoms at `positions` within `distance` of
/// any of these atoms, found by looking at all shifts up to `max_shift`
pub fn brute_force_images(
    positions: &[Vector3D],
    cell: &UnitCell,
    distance: f64,
    max_shift: i32,
) -> Vec<(usize, [i32; 3])> {
    let periodic = cell.periodic();
    let range = |xyz: usize| if periodic[xyz] { -max_shift..=max_shift } else { 0..=0 };

    let mut images = Vec::new();
    for (atom, &position) in positions.iter().enumerate() {
        for a in range(0) {
            for b in range(1) {
                for c in range(2) {
                    let shift = [a, b, c];
                    if shift == [0, 0, 0] {
                        continue;
                    }

                    let image = position + cell.shift_vector(shift);
                    if positions.iter().any(|&p| (image - p).norm() <= distance) {
                        images.push((atom, shift));
                    }
                }
            }
        }
    }
    return images;
}
