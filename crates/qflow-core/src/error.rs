use thiserror::Error;

/// Canonical result for every qflow crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type user callbacks may fail with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required operator parameter was absent when the pipeline was built.
    #[error("argument `{param}` must not be absent")]
    InvalidArgument { param: &'static str },

    /// A user-supplied selector failed. The user's error is carried verbatim.
    #[error(transparent)]
    Callback(BoxError),

    #[error("enumeration cancelled")]
    Cancelled,

    #[error("source `{source_name}` failed: {message}")]
    Source {
        source_name: String,
        message: String,
    },

    /// A non-restartable source was opened a second time.
    #[error("source `{source_name}` cannot be enumerated more than once")]
    SourceExhausted { source_name: String },

    #[error("lookup exceeded the configured limit of {limit} elements")]
    LookupLimit { limit: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Hashing error: {0}")]
    Hash(String),

    #[error("Internal invariant failed: {0}")]
    Invariant(String),
}

impl Error {
    pub fn invalid_argument(param: &'static str) -> Self {
        Error::InvalidArgument { param }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// The user's own error, when this is a callback fault.
    pub fn callback_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Error::Callback(e) => Some(e.as_ref()),
            _ => None,
        }
    }

    /// Downcast a callback fault back to the concrete type the selector returned.
    pub fn downcast_callback<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.callback_error().and_then(|e| e.downcast_ref::<E>())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Hash(e.to_string())
    }
}
