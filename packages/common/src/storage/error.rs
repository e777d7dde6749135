use std::fmt;

/// Errors that can occur at the blob store boundary.
#[derive(Debug)]
pub enum StorageError {
    /// The requested object was not found.
    NotFound(String),
    /// An I/O error occurred, including failures reading the upload stream.
    Io(std::io::Error),
    /// The provided content hash is invalid.
    InvalidHash(String),
    /// The object key is not acceptable to the store.
    InvalidKey(String),
    /// The stream exceeded the configured size limit.
    SizeLimitExceeded { actual: u64, limit: u64 },
    /// The remote store rejected or failed the request.
    Backend(String),
}

impl StorageError {
    /// Whether the failure was caused by the payload rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::SizeLimitExceeded { .. } | Self::InvalidKey(_) | Self::InvalidHash(_)
        )
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "object not found: {key}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::InvalidHash(msg) => write!(f, "invalid content hash: {msg}"),
            Self::InvalidKey(key) => write!(f, "invalid object key: {key:?}"),
            Self::SizeLimitExceeded { actual, limit } => {
                write!(f, "object exceeds size limit ({actual} > {limit} bytes)")
            }
            Self::Backend(msg) => write!(f, "storage backend error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        // The hashing reader smuggles size violations through io::Error.
        if let Some(limit) = err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<LimitExceeded>())
        {
            return Self::SizeLimitExceeded {
                actual: limit.actual,
                limit: limit.limit,
            };
        }
        Self::Io(err)
    }
}

/// Payload carried inside an `io::Error` when a stream passes its byte limit.
#[derive(Debug)]
pub(crate) struct LimitExceeded {
    pub actual: u64,
    pub limit: u64,
}

impl fmt::Display for LimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream exceeds {} bytes", self.limit)
    }
}

impl std::error::Error for LimitExceeded {}
