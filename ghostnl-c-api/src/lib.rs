#![warn(clippy::all, clippy::pedantic)]

// disable some style lints
#![allow(clippy::needless_return, clippy::redundant_field_names, clippy::upper_case_acronyms)]
#![allow(clippy::missing_errors_doc, clippy::missing_safety_doc, clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate, clippy::uninlined_format_args, clippy::redundant_else)]
#![allow(clippy::let_underscore_untyped, clippy::doc_markdown)]

mod utils;
#[macro_use]
mod status;
pub use self::status::{catch_unwind, ghostnl_status_t, ghostnl_last_error};

mod logging;
pub use self::logging::{GHOSTNL_LOG_LEVEL_ERROR, GHOSTNL_LOG_LEVEL_WARN, GHOSTNL_LOG_LEVEL_INFO};
pub use self::logging::{GHOSTNL_LOG_LEVEL_DEBUG, GHOSTNL_LOG_LEVEL_TRACE};
pub use self::logging::{ghostnl_logging_callback_t, ghostnl_set_logging_callback};

pub mod neighbors;

pub mod profiling;
