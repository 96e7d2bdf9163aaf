use std::str::Utf8Error;

#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Got an invalid parameter value in a function
    InvalidParameter(String),
    /// The unit cell or the set of cutoffs can not be used to build neighbor
    /// lists
    Configuration(String),
    /// A neighbor list or a particle was requested with an index outside of
    /// the valid range
    Index(String),
    /// A neighbor list does not fit in the buffer reserved for it
    Capacity(String),
    /// Error while serializing/deserializing data
    Json(serde_json::Error),
    /// Error due to C strings containing non-utf8 data
    Utf8(Utf8Error),
    /// Errors coming from the external potential evaluation engine
    External {
        status: i32,
        message: String
    },
    /// Error used for failed internal consistency check and panics, i.e. bugs
    /// in ghostnl.
    Internal(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidParameter(e) => write!(f, "invalid parameter: {}", e),
            Error::Configuration(e) => write!(f, "invalid configuration: {}", e),
            Error::Index(e) => write!(f, "index out of bounds: {}", e),
            Error::Capacity(e) => write!(f, "neighbor buffer is too small: {}", e),
            Error::Json(e) => write!(f, "json error: {}", e),
            Error::Utf8(e) => write!(f, "utf8 decoding error: {}", e),
            Error::External{status, message} => write!(f, "error from the engine (status {}): {}", status, message),
            Error::Internal(e) => {
                write!(f, "internal ghostnl error")?;
                if e.contains("assertion failed") {
                    write!(f, " (this is likely a bug, please report it)")?;
                }
                write!(f, ": {}", e)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidParameter(_) |
            Error::Configuration(_) |
            Error::Index(_) |
            Error::Capacity(_) |
            Error::Internal(_) |
            Error::External{..} => None,
            Error::Json(e) => Some(e),
            Error::Utf8(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::Json(error)
    }
}

impl From<Utf8Error> for Error {
    fn from(error: Utf8Error) -> Error {
        Error::Utf8(error)
    }
}

// Box<dyn Any + Send + 'static> is the error type in std::panic::catch_unwind
impl From<Box<dyn std::any::Any + Send + 'static>> for Error {
    fn from(error: Box<dyn std::any::Any + Send + 'static>) -> Error {
        let message = if let Some(message) = error.downcast_ref::<String>() {
            message.clone()
        } else if let Some(message) = error.downcast_ref::<&str>() {
            (*message).to_owned()
        } else {
            "panic message is not a string".to_owned()
        };

        Error::Internal(message)
    }
}
