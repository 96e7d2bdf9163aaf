//! The engine requests neighbors of one particle at the time during a compute
//! call, through a C-compatible callback. This module implements this callback
//! on top of any [`NeighborQuery`].
//!
//! The callback never allocates on success, and never lets a panic unwind
//! into the engine: all errors are converted to non-zero status codes and
//! logged.
use std::os::raw::{c_int, c_void};
use std::panic::AssertUnwindSafe;

use log::error;

use crate::{Error, NeighborQuery};

/// Status returned by the callback on success
pub const GET_NEIGHBORS_SUCCESS: c_int = 0;
/// Status returned when the list or particle index is out of bounds
pub const GET_NEIGHBORS_INDEX_ERROR: c_int = 1;
/// Status returned when the callback is used with a different number of
/// neighbor lists, or with invalid pointers
pub const GET_NEIGHBORS_CONFIGURATION_ERROR: c_int = 2;
/// Status returned when the neighbors do not fit in the scratch buffer
pub const GET_NEIGHBORS_CAPACITY_ERROR: c_int = 3;
/// Status returned for any other error, including panics
pub const GET_NEIGHBORS_INTERNAL_ERROR: c_int = 255;

/// Signature of the neighbor callback given to the engine.
///
/// Arguments are the opaque `data` pointer, the number of neighbor lists and
/// their cutoffs, the index of the list, the index of the particle (in the
/// engine's index convention), and two output parameters receiving the number
/// of neighbors and a pointer to the neighbors (in the engine's index
/// convention).
pub type GetNeighborsFn = unsafe extern "C" fn(
    data: *mut c_void,
    n_lists: c_int,
    cutoffs: *const f64,
    list_index: c_int,
    particle: c_int,
    n_neighbors: *mut c_int,
    neighbors: *mut *const c_int,
) -> c_int;

/// Index convention used by the engine for particles and neighbors. Neighbor
/// lists are always zero-based internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum IndexBase {
    /// Particles are numbered from 0
    #[default]
    Zero,
    /// Particles are numbered from 1
    One,
}

impl IndexBase {
    fn offset(self) -> usize {
        match self {
            IndexBase::Zero => 0,
            IndexBase::One => 1,
        }
    }

    /// Convert an index in this convention to a zero-based index, returning
    /// `None` if the index is not valid in this convention
    pub fn to_internal(self, index: c_int) -> Option<usize> {
        let index = usize::try_from(index).ok()?;
        return index.checked_sub(self.offset());
    }

    /// Convert a zero-based index to this convention, returning `None` if the
    /// result does not fit in a `c_int`
    pub fn to_external(self, index: usize) -> Option<c_int> {
        let index = index.checked_add(self.offset())?;
        return c_int::try_from(index).ok();
    }
}

/// Context given to the engine together with [`get_neighbors`], as the opaque
/// `data` pointer.
///
/// The context must outlive all calls to [`get_neighbors`] using it, which is
/// ensured by [`crate::compute`] keeping it on the stack during the whole
/// compute call.
pub struct CallbackContext<'a> {
    query: &'a dyn NeighborQuery,
}

impl<'a> CallbackContext<'a> {
    /// Create a new context answering requests with `query`
    pub fn new(query: &'a dyn NeighborQuery) -> CallbackContext<'a> {
        CallbackContext { query }
    }

    /// Get the neighbor query used by this context
    pub fn query(&self) -> &'a dyn NeighborQuery {
        self.query
    }

    /// Get the opaque pointer to give to [`get_neighbors`]
    pub fn as_ptr(&self) -> *mut c_void {
        (self as *const CallbackContext<'a>).cast_mut().cast()
    }
}

/// Get the status code corresponding to an error
pub fn status_code(error: &Error) -> c_int {
    match error {
        Error::Index(_) => GET_NEIGHBORS_INDEX_ERROR,
        Error::Configuration(_) | Error::InvalidParameter(_) => GET_NEIGHBORS_CONFIGURATION_ERROR,
        Error::Capacity(_) => GET_NEIGHBORS_CAPACITY_ERROR,
        _ => GET_NEIGHBORS_INTERNAL_ERROR,
    }
}

/// Neighbor callback to give to the engine, with a pointer to a
/// [`CallbackContext`] as `data`. The `cutoffs` are not used, lists are
/// identified by their index only.
///
/// On success, `*neighbors` points to a buffer owned by the neighbor query,
/// which stays valid until the next call with the same `list_index`, or until
/// the compute call ends.
///
/// # Safety
///
/// `data` must be NULL or point to a live `CallbackContext`, and
/// `n_neighbors`/`neighbors` must be NULL or valid for writes.
pub unsafe extern "C" fn get_neighbors(
    data: *mut c_void,
    n_lists: c_int,
    _cutoffs: *const f64,
    list_index: c_int,
    particle: c_int,
    n_neighbors: *mut c_int,
    neighbors: *mut *const c_int,
) -> c_int {
    if data.is_null() {
        return reject(n_neighbors, neighbors, &Error::InvalidParameter(
            "got a NULL pointer for the callback data".into()
        ));
    }

    let context = &*(data as *const CallbackContext<'_>);
    return respond(context.query, n_lists, list_index, particle, n_neighbors, neighbors);
}

/// Answer a neighbor request from the engine with `query`, following the
/// conventions of [`get_neighbors`].
///
/// # Safety
///
/// `n_neighbors` and `neighbors` must be NULL or valid for writes.
pub unsafe fn respond(
    query: &dyn NeighborQuery,
    n_lists: c_int,
    list_index: c_int,
    particle: c_int,
    n_neighbors: *mut c_int,
    neighbors: *mut *const c_int,
) -> c_int {
    if n_neighbors.is_null() || neighbors.is_null() {
        return reject(n_neighbors, neighbors, &Error::InvalidParameter(
            "got a NULL pointer for the neighbors outputs".into()
        ));
    }

    *n_neighbors = 0;
    *neighbors = std::ptr::null();

    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
        lookup(query, n_lists, list_index, particle)
    }));

    let error = match result {
        Ok(Ok((count, pointer))) => {
            *n_neighbors = count;
            *neighbors = pointer;
            return GET_NEIGHBORS_SUCCESS;
        }
        Ok(Err(error)) => error,
        Err(panic) => Error::from(panic),
    };

    return reject(n_neighbors, neighbors, &error);
}

fn lookup(query: &dyn NeighborQuery, n_lists: c_int, list_index: c_int, particle: c_int) -> Result<(c_int, *const c_int), Error> {
    let expected_lists = query.cutoffs().len();
    if usize::try_from(n_lists).ok() != Some(expected_lists) {
        return Err(Error::Configuration(format!(
            "the engine requested neighbors with {} lists, but {} were built",
            n_lists, expected_lists
        )));
    }

    let list = usize::try_from(list_index).ok()
        .filter(|&list| list < expected_lists)
        .ok_or_else(|| Error::Index(format!(
            "neighbor list index {} is out of bounds, there are {} lists",
            list_index, expected_lists
        )))?;

    let n_points = query.system().len();
    let index_base = query.index_base();
    let point = index_base.to_internal(particle)
        .filter(|&point| point < n_points)
        .ok_or_else(|| Error::Index(format!(
            "particle index {} is out of bounds for {} particles in {:?}-based indexing",
            particle, n_points, index_base
        )))?;

    let buffer = query.query(list, point)?;
    let count = c_int::try_from(buffer.len()).map_err(|_| Error::Capacity(format!(
        "particle {} has too many neighbors ({})", particle, buffer.len()
    )))?;

    // Cell<c_int> has the same in-memory representation as c_int
    return Ok((count, buffer.as_ptr().cast()));
}

unsafe fn reject(n_neighbors: *mut c_int, neighbors: *mut *const c_int, error: &Error) -> c_int {
    if !n_neighbors.is_null() {
        *n_neighbors = 0;
    }
    if !neighbors.is_null() {
        *neighbors = std::ptr::null();
    }

    error!("neighbor request failed: {}", error);
    return status_code(error);
}
