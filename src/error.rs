//! Error types for the `nbcdb` crate

use std::collections::TryReserveError;

/// Errors that can occur while registering entries or serializing a database.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CdbError {
    /// The builder already holds the maximum number of data blocks.
    #[error("too many data blocks, at most {} are supported", crate::MAX_DATA_COUNT)]
    TooManyData,

    /// The builder already holds the maximum number of keys.
    #[error("too many keys, at most {} are supported", crate::MAX_KEY_COUNT)]
    TooManyKeys,

    /// Adding the data block would push the total data size past `u32::MAX`.
    #[error("total data size would reach {size} bytes, exceeding the 32-bit limit")]
    DataTooLarge {
        /// Total size the data table would have had.
        size: u64,
    },

    /// The exact key bytes are already registered.
    #[error("duplicate key")]
    DuplicateKey,

    /// A key referenced a data block that does not exist.
    #[error("data index {index} out of range, only {count} data blocks exist")]
    InvalidDataIndex {
        /// Index passed by the caller.
        index: u32,
        /// Number of data blocks currently stored.
        count: u32,
    },

    /// Growing one of the internal tables failed.
    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// The output sink rejected a write.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A buffer handed to [`CdbHeader::parse`](crate::CdbHeader::parse) is not a
    /// valid header.
    #[error("invalid header: {0}")]
    InvalidHeader(&'static str),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CdbError>;

impl From<CdbError> for std::io::Error {
    fn from(err: CdbError) -> Self {
        use std::io::ErrorKind;
        match err {
            CdbError::Io(e) => e,
            CdbError::DuplicateKey => std::io::Error::new(ErrorKind::AlreadyExists, err),
            CdbError::InvalidDataIndex { .. } => std::io::Error::new(ErrorKind::InvalidInput, err),
            CdbError::Allocation(_) => std::io::Error::new(ErrorKind::OutOfMemory, err),
            CdbError::InvalidHeader(_) => std::io::Error::new(ErrorKind::InvalidData, err),
            _ => std::io::Error::other(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_conversion() {
        let err: std::io::Error = CdbError::DuplicateKey.into();
        assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);

        let err: std::io::Error = CdbError::InvalidDataIndex { index: 3, count: 1 }.into();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        assert!(err.to_string().contains("data index 3"));

        let inner = std::io::Error::new(std::io::ErrorKind::WriteZero, "full");
        let err: std::io::Error = CdbError::from(inner).into();
        assert_eq!(err.kind(), std::io::ErrorKind::WriteZero);

        let err: std::io::Error = CdbError::TooManyKeys.into();
        assert_eq!(err.kind(), std::io::ErrorKind::Other);
    }
}
