//! Build error types.

use crate::fs::FsError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure while preparing the destination or writing one output file.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("Don't know how to add a source map comment to `{}`", .0.display())]
    UnknownMapTarget(PathBuf),

    #[error("Failed to serialize source map")]
    SourceMap(#[from] serde_json::Error),
}

impl BuildError {
    /// File the error is about, when it names one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Fs(err) => Some(&err.path),
            Self::UnknownMapTarget(path) => Some(path),
            Self::SourceMap(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error_chain;
    use std::io;

    #[test]
    fn test_path() {
        let err = BuildError::from(FsError {
            path: "/site/build".into(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        });
        assert_eq!(err.path(), Some(Path::new("/site/build")));
        assert_eq!(error_chain(&err), "IO error at `/site/build`: denied");

        let err = BuildError::UnknownMapTarget("/site/build/logo.png".into());
        assert_eq!(err.path(), Some(Path::new("/site/build/logo.png")));
        assert!(err.to_string().contains("logo.png"));
    }
}
