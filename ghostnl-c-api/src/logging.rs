use std::ffi::CString;
use std::sync::Mutex;

use log::{Record, Metadata};
use once_cell::sync::Lazy;

use super::status::{ghostnl_status_t, catch_unwind};

/// The "error" level designates very serious errors, such as a neighbor
/// request rejected during a compute call
pub const GHOSTNL_LOG_LEVEL_ERROR: i32 = 1;

/// The "warn" level designates hazardous situations, such as atoms very close
/// to one another
pub const GHOSTNL_LOG_LEVEL_WARN: i32 = 2;

/// The "info" level designates useful information
pub const GHOSTNL_LOG_LEVEL_INFO: i32 = 3;

/// The "debug" level designates lower priority information, such as the
/// number of ghost atoms and neighbors created for each system
///
/// By default, log messages at this level are disabled in release mode, and
/// enabled in debug mode.
pub const GHOSTNL_LOG_LEVEL_DEBUG: i32 = 4;

/// The "trace" level designates very low priority, often extremely verbose,
/// information.
pub const GHOSTNL_LOG_LEVEL_TRACE: i32 = 5;

/// Callback function type for the logging system. Such functions are called
/// when a log event is emitted in the code.
///
/// The first argument is the log level, one of `GHOSTNL_LOG_LEVEL_ERROR`,
/// `GHOSTNL_LOG_LEVEL_WARN` `GHOSTNL_LOG_LEVEL_INFO`, `GHOSTNL_LOG_LEVEL_DEBUG`,
/// or `GHOSTNL_LOG_LEVEL_TRACE`. The second argument is a NULL-terminated
/// string containing the message associated with the log event.
#[allow(non_camel_case_types)]
pub type ghostnl_logging_callback_t = Option<unsafe extern fn(level: i32, message: *const std::os::raw::c_char)>;

static GLOBAL_CALLBACK: Lazy<Mutex<ghostnl_logging_callback_t>> = Lazy::new(|| Mutex::new(None));

/// Implementation of `log::Log` that forward all log messages to the global
/// `ghostnl_logging_callback_t`.
struct GhostnlLogger;

/// Set the given ``callback`` function as the global logging callback. This
/// function will be called on all log events. If a logging callback was
/// already set, it is replaced by the new one. Passing `NULL` disables the
/// logging.
///
/// @param callback the new logging callback, or `NULL`
///
/// @returns The status code of this operation. If the status is not
///          `GHOSTNL_SUCCESS`, you can use `ghostnl_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn ghostnl_set_logging_callback(callback: ghostnl_logging_callback_t) -> ghostnl_status_t {
    catch_unwind(|| {
        *GLOBAL_CALLBACK.lock().expect("mutex was poisoned") = callback;
        // we allow multiple sets of logger, therefore the result will be ignored
        let _ = log::set_boxed_logger(Box::new(GhostnlLogger));

        if cfg!(debug_assertions) {
            log::set_max_level(log::LevelFilter::Debug);
        } else {
            log::set_max_level(log::LevelFilter::Info);
        }

        Ok(())
    })
}

impl log::Log for GhostnlLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        return true;
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!("{} -- {}", record.target(), record.args());
            let message = CString::new(message.replace('\0', "\\0")).unwrap_or_default();
            let callback = *GLOBAL_CALLBACK.lock().expect("mutex was poisoned");
            if let Some(callback) = callback {
                unsafe {
                    callback(record.level() as i32, message.as_ptr());
                }
            }
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;
    use std::os::raw::c_char;

    use super::*;

    static MESSAGES: Lazy<Mutex<Vec<(i32, String)>>> = Lazy::new(|| Mutex::new(Vec::new()));

    unsafe extern fn record_message(level: i32, message: *const c_char) {
        let message = CStr::from_ptr(message).to_string_lossy().into_owned();
        MESSAGES.lock().unwrap().push((level, message));
    }

    #[test]
    fn log_levels() {
        assert_eq!(GHOSTNL_LOG_LEVEL_ERROR, log::Level::Error as i32);
        assert_eq!(GHOSTNL_LOG_LEVEL_WARN, log::Level::Warn as i32);
        assert_eq!(GHOSTNL_LOG_LEVEL_INFO, log::Level::Info as i32);
        assert_eq!(GHOSTNL_LOG_LEVEL_DEBUG, log::Level::Debug as i32);
        assert_eq!(GHOSTNL_LOG_LEVEL_TRACE, log::Level::Trace as i32);
    }

    #[test]
    fn forward_messages() {
        let status = unsafe { ghostnl_set_logging_callback(Some(record_message)) };
        assert!(status.is_success());

        log::warn!(target: "ghostnl::test", "atoms are too close");

        let messages = MESSAGES.lock().unwrap();
        assert!(messages.contains(&(GHOSTNL_LOG_LEVEL_WARN, "ghostnl::test -- atoms are too close".into())));
    }
}
