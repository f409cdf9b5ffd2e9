use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no asset stored at {0}")]
    NotFound(String),

    /// `locator` is the rejected input, kept verbatim for logs.
    #[error("asset locator {locator:?} rejected: {reason}")]
    InvalidLocator {
        locator: String,
        reason: &'static str,
    },

    #[error("asset is {actual} bytes, over the {limit} byte limit")]
    SizeLimitExceeded { actual: u64, limit: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub(crate) fn invalid_locator(locator: &str, reason: &'static str) -> Self {
        Self::InvalidLocator {
            locator: locator.to_string(),
            reason,
        }
    }
}
