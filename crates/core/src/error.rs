use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure kinds surfaced by every inspection step.
#[derive(Error, Debug)]
pub enum BlkError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BlkError {
    /// Classifies an I/O failure that happened while touching `path`.
    pub fn from_io(path: impl AsRef<Path>, err: io::Error) -> Self {
        let path = path.as_ref();
        match err.kind() {
            io::ErrorKind::NotFound => BlkError::NotFound(path.display().to_string()),
            io::ErrorKind::PermissionDenied => {
                BlkError::PermissionDenied(path.display().to_string())
            }
            _ => BlkError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BlkError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, BlkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_io_kinds() {
        let err = BlkError::from_io("/dev/nope", io::Error::from(io::ErrorKind::NotFound));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not found: /dev/nope");

        let err = BlkError::from_io(
            "/run/udev/data/b8:0",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, BlkError::PermissionDenied(_)));

        let err = BlkError::from_io("/sys/block", io::Error::from(io::ErrorKind::Interrupted));
        assert!(matches!(err, BlkError::Io { .. }));
    }
}
