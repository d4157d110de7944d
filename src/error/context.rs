//! Context helpers for attaching paths to I/O failures.

use super::{ItfError, Result};
use std::path::Path;

/// Extension trait to add context to `Result` values.
pub trait ResultExt<T> {
    /// Wrap the error with a static or computed message.
    ///
    /// # Errors
    ///
    /// Returns the original error wrapped in [`ItfError::WithContext`].
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Wrap the error with a message naming the path it concerns.
    ///
    /// # Errors
    ///
    /// Returns the original error wrapped in [`ItfError::WithContext`].
    fn with_path(self, action: &str, path: &Path) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|source| ItfError::with_context(message, source))
    }

    fn with_path(self, action: &str, path: &Path) -> Result<T> {
        self.map_err(|source| ItfError::with_context(format!("{action} '{}'", path.display()), source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn with_path_names_the_path() {
        let failed: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        let err = failed
            .with_path("create directory", Path::new("/tmp/x"))
            .unwrap_err();
        assert_eq!(err.to_string(), "create directory '/tmp/x': denied");
    }
}
