// error.rs: Error types for the confined file store.
//
// Every store operation returns a StoreError. The variants carry enough
// detail for server-side logs; `kind()` collapses them into the closed
// ErrorKind taxonomy that callers match on.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Closed classification of store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The path resolves outside the store root.
    AccessDenied,
    /// The target does not exist (or is not a regular file, for reads).
    NotFound,
    /// A directory was expected.
    NotADirectory,
    /// The move destination is already taken.
    AlreadyExists,
    /// The OS refused the operation, or file content could not be decoded.
    Io,
    /// Anything not covered above.
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::AccessDenied => "access_denied",
            ErrorKind::NotFound => "not_found",
            ErrorKind::NotADirectory => "not_a_directory",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::Io => "io",
            ErrorKind::Unexpected => "unexpected",
        };
        write!(f, "{}", s)
    }
}

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested path escapes the root (directly, via `..`, or via a symlink).
    #[error("access denied: '{path}' resolves outside the root")]
    AccessDenied { path: String },

    /// The target does not exist.
    #[error("not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// The target is not an existing directory.
    #[error("not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },

    /// The move destination already exists.
    #[error("already exists: {}", .path.display())]
    AlreadyExists { path: PathBuf },

    /// The file exists but its content is not valid UTF-8.
    #[error("content of {} is not valid UTF-8", .path.display())]
    InvalidUtf8 { path: PathBuf },

    /// A file I/O operation failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A search pattern could not be compiled.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Catch-all for failures that fit nowhere else.
    #[error("{0}")]
    Unexpected(String),
}

impl StoreError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::AccessDenied { .. } => ErrorKind::AccessDenied,
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::NotADirectory { .. } => ErrorKind::NotADirectory,
            StoreError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            StoreError::InvalidUtf8 { .. } | StoreError::Io { .. } => ErrorKind::Io,
            StoreError::InvalidPattern { .. } | StoreError::Unexpected(_) => {
                ErrorKind::Unexpected
            }
        }
    }

    /// Wrap an I/O error, promoting `NotFound` to the dedicated variant.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound { path }
        } else {
            StoreError::Io { path, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn io_not_found_is_promoted() {
        let err = StoreError::io("a.txt", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn other_io_errors_stay_io() {
        let err = StoreError::io("a.txt", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn decode_failures_are_io_kind() {
        let err = StoreError::InvalidUtf8 {
            path: PathBuf::from("bin.dat"),
        };
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("not valid UTF-8"));
    }

    #[test]
    fn bad_patterns_are_unexpected() {
        let err = StoreError::InvalidPattern {
            pattern: "[".into(),
            reason: "unclosed".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Unexpected);
    }
}
