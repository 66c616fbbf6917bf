//! Temporary on-disk area for one external compiler run.
//!
//! The stylesheet compiler writes its output (and any side files such as
//! sprite images) into a scratch directory, and reads its configuration from
//! a scratch file. Everything is removed when the workspace is dropped, on
//! success and error paths alike.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::{Builder, TempDir, TempPath};

/// Prefix for every scratch entry, so stray leftovers are recognisable.
const PREFIX: &str = "awe-";

/// A uniquely named scratch directory plus any scratch files created for it.
#[derive(Debug)]
pub struct ScratchWorkspace {
    dir: TempDir,
    files: Vec<TempPath>,
}

impl ScratchWorkspace {
    /// Create a fresh workspace under the system temp directory.
    pub fn new() -> io::Result<Self> {
        let dir = Builder::new().prefix(PREFIX).tempdir()?;
        Ok(Self {
            dir,
            files: Vec::new(),
        })
    }

    /// The scratch directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a scratch file outside the scratch directory holding
    /// `contents`, and return its path. The file lives as long as the
    /// workspace.
    pub fn file(&mut self, suffix: &str, contents: &[u8]) -> io::Result<PathBuf> {
        let mut file = Builder::new().prefix(PREFIX).suffix(suffix).tempfile()?;
        file.write_all(contents)?;
        file.flush()?;

        let temp_path = file.into_temp_path();
        let path = temp_path.to_path_buf();
        self.files.push(temp_path);
        Ok(path)
    }

    /// Remove everything now, reporting the first failure.
    ///
    /// Dropping the workspace does the same but ignores errors.
    pub fn close(self) -> io::Result<()> {
        for file in self.files {
            file.close()?;
        }
        self.dir.close()
    }
}
