use crate::{Vector3D, Matrix3};
use super::UnitCell;

/// Get the positions and unit cell of one of the systems used in tests
pub fn test_system(name: &str) -> (Vec<Vector3D>, UnitCell) {
    match name {
        "dimer" => get_dimer(),
        "single" => get_single(),
        "methane" => get_methane(),
        "NaCl" => get_nacl(),
        "slab" => get_slab(),
        _ => panic!("unknown test system {}", name)
    }
}

/// Two atoms at distance 1, without periodicity
fn get_dimer() -> (Vec<Vector3D>, UnitCell) {
    let positions = vec![Vector3D::new(0.0, 0.0, 0.0), Vector3D::new(1.0, 0.0, 0.0)];
    return (positions, UnitCell::infinite());
}

/// A single atom in a small cubic cell
fn get_single() -> (Vec<Vector3D>, UnitCell) {
    let cell = UnitCell::cubic(2.0).expect("valid cell");
    return (vec![Vector3D::zero()], cell);
}

fn get_methane() -> (Vec<Vector3D>, UnitCell) {
    let positions = vec![
        Vector3D::new(5.0000, 5.0000, 5.0000),
        Vector3D::new(5.5288, 5.1610, 5.9359),
        Vector3D::new(5.2051, 5.8240, 4.3214),
        Vector3D::new(5.3345, 4.0686, 4.5504),
        Vector3D::new(3.9315, 4.9463, 5.1921),
    ];
    let cell = UnitCell::cubic(5.0).expect("valid cell");
    return (positions, cell);
}

/// NaCl structure in a primitive unit cell, the distance between the closest
/// Na-Cl pair is exactly 1.
fn get_nacl() -> (Vec<Vector3D>, UnitCell) {
    let matrix = Matrix3::new([[0.0, 1.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 0.0]]);
    let cell = UnitCell::new(matrix, [true, true, true]).expect("valid cell");
    let positions = vec![Vector3D::new(0.0, 0.0, 0.0), Vector3D::new(1.0, 0.0, 0.0)];
    return (positions, cell);
}

/// Slab periodic in the x and y directions only
fn get_slab() -> (Vec<Vector3D>, UnitCell) {
    let matrix = Matrix3::new([[3.0, 0.0, 0.0], [0.5, 2.8, 0.0], [0.0, 0.0, 1.0]]);
    let cell = UnitCell::new(matrix, [true, true, false]).expect("valid cell");
    let positions = vec![
        Vector3D::new(0.1, 0.2, 0.0),
        Vector3D::new(1.6, 1.1, 0.7),
        Vector3D::new(2.2, 2.5, -1.3),
    ];
    return (positions, cell);
}
