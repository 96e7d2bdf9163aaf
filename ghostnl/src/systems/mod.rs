mod cell;
pub use self::cell::UnitCell;

mod cell_list;
pub use self::cell_list::CellList;

mod ghosts;
pub use self::ghosts::{generate_ghosts, Ghosts, GhostPadding};

mod extended;
pub use self::extended::ExtendedSystem;

mod neighbors;
pub use self::neighbors::{build_neighbor_lists, NeighborArrays};

#[cfg(test)]
pub(crate) mod test_utils;
