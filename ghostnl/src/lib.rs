#![warn(clippy::all, clippy::pedantic)]

// disable some style lints
#![allow(clippy::needless_return, clippy::must_use_candidate, clippy::comparison_chain)]
#![allow(clippy::redundant_field_names, clippy::redundant_closure_for_method_calls)]
#![allow(clippy::unreadable_literal, clippy::option_if_let_else, clippy::range_plus_one)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc, clippy::module_name_repetitions)]

#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap, clippy::cast_lossless, clippy::cast_sign_loss)]
#![allow(clippy::default_trait_access)]

// Tests lints
#![cfg_attr(test, allow(clippy::float_cmp))]

pub mod types;
pub use types::*;

mod errors;
pub use self::errors::Error;

pub mod systems;
pub use systems::{UnitCell, ExtendedSystem, GhostPadding};

mod options;
pub use self::options::NeighborListOptions;

mod query;
pub use self::query::{NeighborQuery, GhostNeighborList, PrecomputedNeighbors};

pub mod bridge;
pub use self::bridge::IndexBase;

mod reduce;
pub use self::reduce::reduce;

mod compute;
pub use self::compute::{compute, Engine, NeighborRequirements};
pub use self::compute::{ComputeArguments, ComputeOutput, ComputeRequest, NeighborCallback};
