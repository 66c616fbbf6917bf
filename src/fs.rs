//! File system capability used by the build.
//!
//! The build only talks to the disk through [`FileSystem`], which keeps the
//! orchestrator free of `std::fs` calls and gives every failure the path it
//! happened on.

use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use walkdir::WalkDir;

/// Result type for file system operations
pub type FsResult<T> = Result<T, FsError>;

/// A failed file system operation and the path it was applied to
#[derive(Debug, Error)]
#[error("IO error at `{}`", .path.display())]
pub struct FsError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Attach a path to an `io::Result`.
pub trait IoResultExt<T> {
    fn at(self, path: &Path) -> FsResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn at(self, path: &Path) -> FsResult<T> {
        self.map_err(|source| FsError {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Abstract file system interface
pub trait FileSystem {
    /// Check if a file, directory or symlink target exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a directory (following symlinks)
    fn is_dir(&self, path: &Path) -> bool;

    /// Read a whole file
    fn read(&self, path: &Path) -> FsResult<Vec<u8>>;

    /// Write a whole file, creating missing parent directories
    fn write(&self, path: &Path, content: &[u8]) -> FsResult<()>;

    /// Create directory and parents
    fn create_dir_all(&self, path: &Path) -> FsResult<()>;

    /// Remove everything inside a directory, keeping the directory itself
    fn clean_dir(&self, path: &Path) -> FsResult<()>;

    /// Create a directory symlink at `link` pointing to `target`
    fn symlink(&self, target: &Path, link: &Path) -> FsResult<()>;

    /// Names of the immediate children of a directory, in no particular order
    fn list(&self, dir: &Path) -> FsResult<Vec<String>>;
}

/// Standard local file system
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read(&self, path: &Path) -> FsResult<Vec<u8>> {
        fs::read(path).at(path)
    }

    fn write(&self, path: &Path, content: &[u8]) -> FsResult<()> {
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).at(parent)?;
        }
        fs::write(path, content).at(path)
    }

    fn create_dir_all(&self, path: &Path) -> FsResult<()> {
        fs::create_dir_all(path).at(path)
    }

    fn clean_dir(&self, path: &Path) -> FsResult<()> {
        for entry in fs::read_dir(path).at(path)? {
            let entry = entry.at(path)?;
            let child = entry.path();

            // file_type() does not follow symlinks, so a linked directory
            // is unlinked rather than emptied
            if entry.file_type().at(&child)?.is_dir() {
                fs::remove_dir_all(&child).at(&child)?;
            } else {
                fs::remove_file(&child)
                    .or_else(|_| fs::remove_dir(&child))
                    .at(&child)?;
            }
        }
        Ok(())
    }

    fn symlink(&self, target: &Path, link: &Path) -> FsResult<()> {
        #[cfg(unix)]
        let result = std::os::unix::fs::symlink(target, link);
        #[cfg(windows)]
        let result = std::os::windows::fs::symlink_dir(target, link);

        result.at(link)
    }

    fn list(&self, dir: &Path) -> FsResult<Vec<String>> {
        WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .map(|entry| {
                entry
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .map_err(io::Error::from)
                    .at(dir)
            })
            .collect()
    }
}
