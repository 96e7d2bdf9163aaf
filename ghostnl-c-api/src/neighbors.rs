use std::os::raw::{c_char, c_int, c_void};
use std::ffi::CStr;
use std::ops::Deref;
use std::panic::AssertUnwindSafe;

use ghostnl::{Error, GhostNeighborList, NeighborListOptions, NeighborQuery};
use ghostnl::{Matrix3, UnitCell, Vector3D};
use ghostnl::bridge::{self, CallbackContext};

use super::{catch_unwind, ghostnl_status_t};

/// Status returned by `ghostnl_get_neighbors` on success
pub const GHOSTNL_GET_NEIGHBORS_SUCCESS: c_int = 0;
/// Status returned by `ghostnl_get_neighbors` when the list or particle index
/// is out of bounds
pub const GHOSTNL_GET_NEIGHBORS_INDEX_ERROR: c_int = 1;
/// Status returned by `ghostnl_get_neighbors` when called with the wrong
/// number of lists or invalid pointers
pub const GHOSTNL_GET_NEIGHBORS_CONFIGURATION_ERROR: c_int = 2;
/// Status returned by `ghostnl_get_neighbors` when a neighbor list does not
/// fit in its buffer
pub const GHOSTNL_GET_NEIGHBORS_CAPACITY_ERROR: c_int = 3;
/// Status returned by `ghostnl_get_neighbors` for any other error
pub const GHOSTNL_GET_NEIGHBORS_INTERNAL_ERROR: c_int = 255;

/// Opaque type containing ghost atoms and neighbor lists for a single system
#[allow(non_camel_case_types)]
pub struct ghostnl_neighbors_t(GhostNeighborList);

impl Deref for ghostnl_neighbors_t {
    type Target = GhostNeighborList;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Create ghost atoms and neighbor lists for a system containing `n_atoms`
/// atoms.
///
/// All memory allocated by this function can be released using
/// `ghostnl_neighbors_free`.
///
/// @param positions positions of the atoms, as a `n_atoms x 3` row-major array
/// @param n_atoms number of atoms in the system
/// @param cell lattice matrix of the system, as a 3x3 row-major array where
///             the rows are the lattice vectors
/// @param periodic periodic boundary conditions along each lattice vector
/// @param options JSON-formatted options for the neighbor lists, as a
///                NULL-terminated string. The only required field is
///                `"cutoffs"`.
///
/// @returns A pointer to the newly allocated neighbor lists, or a `NULL`
///          pointer in case of error. In case of error, you can use
///          `ghostnl_last_error()` to get the error message.
#[no_mangle]
pub unsafe extern fn ghostnl_neighbors(
    positions: *const f64,
    n_atoms: usize,
    cell: *const f64,
    periodic: *const bool,
    options: *const c_char,
) -> *mut ghostnl_neighbors_t {
    let mut raw = std::ptr::null_mut();
    let unwind_wrapper = std::panic::AssertUnwindSafe(&mut raw);
    let status = catch_unwind(move || {
        let unwind_wrapper = unwind_wrapper;

        check_pointers!(cell, periodic, options);
        if n_atoms != 0 {
            check_pointers!(positions);
        }

        let positions: &[[f64; 3]] = if n_atoms == 0 {
            &[]
        } else {
            std::slice::from_raw_parts(positions.cast::<[f64; 3]>(), n_atoms)
        };
        let positions = positions.iter().map(|&p| Vector3D::from(p)).collect::<Vec<_>>();

        let cell = std::slice::from_raw_parts(cell.cast::<[f64; 3]>(), 3);
        let periodic = std::slice::from_raw_parts(periodic, 3);
        let cell = UnitCell::new(
            Matrix3::new([cell[0], cell[1], cell[2]]),
            [periodic[0], periodic[1], periodic[2]],
        )?;

        let options = NeighborListOptions::from_json(CStr::from_ptr(options).to_str()?)?;
        let neighbors = GhostNeighborList::new(&positions, &cell, options)?;

        *unwind_wrapper.0 = Box::into_raw(Box::new(ghostnl_neighbors_t(neighbors)));
        Ok(())
    });

    if !status.is_success() {
        return std::ptr::null_mut();
    }

    return raw;
}

/// Free the memory associated with `neighbors` previously created with
/// `ghostnl_neighbors`.
///
/// If `neighbors` is `NULL`, this function does nothing.
///
/// @param neighbors pointer to existing neighbor lists, or `NULL`
///
/// @returns The status code of this operation. If the status is not
///          `GHOSTNL_SUCCESS`, you can use `ghostnl_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn ghostnl_neighbors_free(neighbors: *mut ghostnl_neighbors_t) -> ghostnl_status_t {
    catch_unwind(AssertUnwindSafe(|| {
        if !neighbors.is_null() {
            let boxed = Box::from_raw(neighbors);
            std::mem::drop(boxed);
        }

        Ok(())
    }))
}

/// Get the cutoffs of the neighbor lists in `neighbors`. The number of
/// cutoffs is the number of neighbor lists to use with
/// `ghostnl_get_neighbors`.
///
/// @param neighbors pointer to existing neighbor lists
/// @param cutoffs pointer to be filled with the address of the cutoffs array
/// @param count pointer to be filled with the number of cutoffs
///
/// @returns The status code of this operation. If the status is not
///          `GHOSTNL_SUCCESS`, you can use `ghostnl_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn ghostnl_neighbors_cutoffs(
    neighbors: *const ghostnl_neighbors_t,
    cutoffs: *mut *const f64,
    count: *mut usize,
) -> ghostnl_status_t {
    catch_unwind(AssertUnwindSafe(|| {
        check_pointers!(neighbors, cutoffs, count);
        let values = (*neighbors).cutoffs();
        *cutoffs = values.as_ptr();
        *count = values.len();
        Ok(())
    }))
}

/// Get the positions of all particles (real atoms followed by ghost atoms)
/// as a `n_particles x 3` row-major array. The array is owned by `neighbors`.
///
/// @param neighbors pointer to existing neighbor lists
/// @param positions pointer to be filled with the address of the positions
/// @param n_particles pointer to be filled with the number of particles
///
/// @returns The status code of this operation. If the status is not
///          `GHOSTNL_SUCCESS`, you can use `ghostnl_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn ghostnl_neighbors_positions(
    neighbors: *const ghostnl_neighbors_t,
    positions: *mut *const f64,
    n_particles: *mut usize,
) -> ghostnl_status_t {
    catch_unwind(AssertUnwindSafe(|| {
        check_pointers!(neighbors, positions, n_particles);
        let system = (*neighbors).system();
        *positions = system.positions().as_ptr().cast();
        *n_particles = system.len();
        Ok(())
    }))
}

/// Get the contributing flag of all particles: 1 for real atoms and 0 for
/// ghost atoms. The array is owned by `neighbors`.
///
/// @param neighbors pointer to existing neighbor lists
/// @param contributing pointer to be filled with the address of the flags
/// @param n_particles pointer to be filled with the number of particles
///
/// @returns The status code of this operation. If the status is not
///          `GHOSTNL_SUCCESS`, you can use `ghostnl_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn ghostnl_neighbors_contributing(
    neighbors: *const ghostnl_neighbors_t,
    contributing: *mut *const c_int,
    n_particles: *mut usize,
) -> ghostnl_status_t {
    catch_unwind(AssertUnwindSafe(|| {
        check_pointers!(neighbors, contributing, n_particles);
        let system = (*neighbors).system();
        *contributing = system.contributing().as_ptr();
        *n_particles = system.len();
        Ok(())
    }))
}

/// Get the zero-based index of the real atom each particle is an image of.
/// Real atoms are images of themselves. The array is owned by `neighbors`.
///
/// @param neighbors pointer to existing neighbor lists
/// @param image_of pointer to be filled with the address of the indexes
/// @param n_particles pointer to be filled with the number of particles
/// @param n_real pointer to be filled with the number of real atoms
///
/// @returns The status code of this operation. If the status is not
///          `GHOSTNL_SUCCESS`, you can use `ghostnl_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn ghostnl_neighbors_image_of(
    neighbors: *const ghostnl_neighbors_t,
    image_of: *mut *const usize,
    n_particles: *mut usize,
    n_real: *mut usize,
) -> ghostnl_status_t {
    catch_unwind(AssertUnwindSafe(|| {
        check_pointers!(neighbors, image_of, n_particles, n_real);
        let system = (*neighbors).system();
        *image_of = system.image_of().as_ptr();
        *n_particles = system.len();
        *n_real = system.n_real();
        Ok(())
    }))
}

/// Sum per-particle `values` (for example forces) onto the real atoms,
/// adding the values of ghost atoms to the real atom they are an image of.
///
/// @param neighbors pointer to existing neighbor lists
/// @param values per-particle values, as a `n_particles x n_components`
///               row-major array
/// @param n_particles number of particles in `values`, this must match the
///                    number of particles in `neighbors`
/// @param n_components number of components for each particle
/// @param reduced output array, as a `n_real x n_components` row-major array
/// @param n_real number of real atoms in `reduced`
///
/// @returns The status code of this operation. If the status is not
///          `GHOSTNL_SUCCESS`, you can use `ghostnl_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn ghostnl_neighbors_reduce(
    neighbors: *const ghostnl_neighbors_t,
    values: *const f64,
    n_particles: usize,
    n_components: usize,
    reduced: *mut f64,
    n_real: usize,
) -> ghostnl_status_t {
    catch_unwind(AssertUnwindSafe(|| {
        check_pointers!(neighbors, values, reduced);
        let system = (*neighbors).system();

        if n_particles != system.len() || n_real != system.n_real() {
            return Err(Error::InvalidParameter(format!(
                "expected {} particles and {} real atoms, got {} and {}",
                system.len(), system.n_real(), n_particles, n_real
            )));
        }

        if n_components == 0 {
            return Ok(());
        }

        let values = std::slice::from_raw_parts(values, n_particles * n_components);
        let reduced = std::slice::from_raw_parts_mut(reduced, n_real * n_components);

        for component in 0..n_components {
            let column = values.iter().skip(component).step_by(n_components).copied().collect::<Vec<_>>();
            let column = system.reduce(&column)?;
            for (atom, value) in column.into_iter().enumerate() {
                reduced[atom * n_components + component] = value;
            }
        }

        Ok(())
    }))
}

/// Neighbor callback to give to an external engine, using a pointer to
/// `ghostnl_neighbors_t` as `data`.
///
/// The neighbors of particle `particle` in the neighbor list at index
/// `list_index` are written to `neighbors` and `n_neighbors`, using the index
/// convention from the options. `n_lists` must be the number of cutoffs, and
/// `cutoffs` is not used. The neighbors array is owned by `data`, and stays
/// valid until the next call with the same `list_index`.
///
/// This function never allocates memory on success.
///
/// @returns `GHOSTNL_GET_NEIGHBORS_SUCCESS` (0) on success, or one of the
///          `GHOSTNL_GET_NEIGHBORS_*_ERROR` values. In case of error,
///          `n_neighbors` is set to 0 and `neighbors` to `NULL`.
#[no_mangle]
pub unsafe extern fn ghostnl_get_neighbors(
    data: *mut c_void,
    n_lists: c_int,
    cutoffs: *const f64,
    list_index: c_int,
    particle: c_int,
    n_neighbors: *mut c_int,
    neighbors: *mut *const c_int,
) -> c_int {
    if data.is_null() {
        return bridge::get_neighbors(data, n_lists, cutoffs, list_index, particle, n_neighbors, neighbors);
    }

    let list = &*data.cast::<ghostnl_neighbors_t>();
    let context = CallbackContext::new(&list.0);
    return bridge::get_neighbors(context.as_ptr(), n_lists, cutoffs, list_index, particle, n_neighbors, neighbors);
}
