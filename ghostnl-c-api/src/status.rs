use std::panic::UnwindSafe;
use std::cell::RefCell;
use std::os::raw::c_char;
use std::ffi::CString;

use ghostnl::Error;

// Save the last error message in thread local storage.
//
// This is marginally better than a standard global static value because it
// allow multiple threads to each have separate errors conditions.
thread_local! {
    pub static LAST_ERROR_MESSAGE: RefCell<CString> = RefCell::new(CString::default());
}

/// Status type returned by all functions in the C API.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum ghostnl_status_t {
    /// The function succeeded
    GHOSTNL_SUCCESS = 0,
    /// A function got an invalid parameter
    GHOSTNL_INVALID_PARAMETER_ERROR = 1,
    /// There was an error reading or writing JSON
    GHOSTNL_JSON_ERROR = 2,
    /// A string contains non-utf8 data
    GHOSTNL_UTF8_ERROR = 3,
    /// The unit cell or the neighbor lists options are invalid
    GHOSTNL_CONFIGURATION_ERROR = 4,
    /// An index is out of bounds
    GHOSTNL_INDEX_ERROR = 5,
    /// A neighbor list does not fit in its buffer
    GHOSTNL_CAPACITY_ERROR = 6,
    /// The external engine returned an error
    GHOSTNL_EXTERNAL_ERROR = 7,
    /// There was an error of unknown kind
    GHOSTNL_UNKNOWN_ERROR = 254,
    /// There was an internal error (rust panic)
    GHOSTNL_INTERNAL_PANIC = 255,
}

impl ghostnl_status_t {
    pub fn is_success(self) -> bool {
        self == ghostnl_status_t::GHOSTNL_SUCCESS
    }
}

impl From<Error> for ghostnl_status_t {
    fn from(error: Error) -> ghostnl_status_t {
        LAST_ERROR_MESSAGE.with(|message| {
            let text = error.to_string().replace('\0', "\\0");
            *message.borrow_mut() = CString::new(text).unwrap_or_default();
        });
        match error {
            Error::InvalidParameter(_) => ghostnl_status_t::GHOSTNL_INVALID_PARAMETER_ERROR,
            Error::Json(_) => ghostnl_status_t::GHOSTNL_JSON_ERROR,
            Error::Utf8(_) => ghostnl_status_t::GHOSTNL_UTF8_ERROR,
            Error::Configuration(_) => ghostnl_status_t::GHOSTNL_CONFIGURATION_ERROR,
            Error::Index(_) => ghostnl_status_t::GHOSTNL_INDEX_ERROR,
            Error::Capacity(_) => ghostnl_status_t::GHOSTNL_CAPACITY_ERROR,
            Error::External{..} => ghostnl_status_t::GHOSTNL_EXTERNAL_ERROR,
            Error::Internal(_) => ghostnl_status_t::GHOSTNL_INTERNAL_PANIC,
            _ => ghostnl_status_t::GHOSTNL_UNKNOWN_ERROR,
        }
    }
}

/// An alternative to `std::panic::catch_unwind` that automatically transform
/// the error into `ghostnl_status_t`.
pub fn catch_unwind<F>(function: F) -> ghostnl_status_t where F: FnOnce() -> Result<(), Error> + UnwindSafe {
    match std::panic::catch_unwind(function) {
        Ok(Ok(())) => ghostnl_status_t::GHOSTNL_SUCCESS,
        Ok(Err(error)) => error.into(),
        Err(error) => Error::from(error).into()
    }
}

/// Check that pointers (used as C API function parameters) are not null.
#[macro_export]
macro_rules! check_pointers {
    ($pointer: ident) => {
        if $pointer.is_null() {
            return Err(ghostnl::Error::InvalidParameter(
                format!("got invalid NULL pointer for {}", stringify!($pointer))
            ));
        }
    };
    ($($pointer: ident),* $(,)?) => {
        $(check_pointers!($pointer);)*
    }
}

/// Get the last error message that was created on the current thread.
///
/// @returns the last error message, as a NULL-terminated string
#[no_mangle]
pub unsafe extern fn ghostnl_last_error() -> *const c_char {
    let mut result = std::ptr::null();
    let wrapper = std::panic::AssertUnwindSafe(&mut result);
    let status = catch_unwind(move || {
        let wrapper = wrapper;
        LAST_ERROR_MESSAGE.with(|message| {
            *wrapper.0 = message.borrow().as_ptr();
        });
        Ok(())
    });

    if !status.is_success() {
        eprintln!("ERROR: unable to get last error message!");
        return std::ptr::null();
    }

    return result;
}
