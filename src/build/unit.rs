//! The value threaded through compile and write.

use crate::{output::Action, sourcemap::SourceMap};
use std::path::PathBuf;

/// Output for one logical destination file.
///
/// Produced by copying, compiling or concatenating, consumed by
/// `AssetBuilder::write`. A file that failed to build has no unit at all.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildUnit {
    pub content: Vec<u8>,
    /// Absolute destination file
    pub dest: PathBuf,
    /// Number of source files combined into `content` (more than 1 only for
    /// bundles)
    pub file_count: usize,
    /// Verb to report after writing, `None` to write silently
    pub action: Option<Action>,
    pub source_map: Option<SourceMap>,
}

impl BuildUnit {
    /// A single-file unit with no action and no map.
    pub fn new(content: impl Into<Vec<u8>>, dest: impl Into<PathBuf>) -> Self {
        Self {
            content: content.into(),
            dest: dest.into(),
            file_count: 1,
            action: None,
            source_map: None,
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_file_count(mut self, file_count: usize) -> Self {
        self.file_count = file_count;
        self
    }

    pub fn with_source_map(mut self, source_map: Option<SourceMap>) -> Self {
        self.source_map = source_map;
        self
    }

    /// Notes shown after the path when reporting, e.g. `(3 files)`.
    pub fn notes(&self) -> String {
        if self.file_count > 1 {
            format!("({} files)", self.file_count)
        } else {
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let unit = BuildUnit::new("a{}", "/site/build/main.css");
        assert_eq!(unit.file_count, 1);
        assert_eq!(unit.action, None);
        assert!(unit.source_map.is_none());
        assert_eq!(unit.notes(), "");
    }

    #[test]
    fn test_notes_for_bundles() {
        let unit = BuildUnit::new("", "/site/build/app.js")
            .with_action(Action::Compiled)
            .with_file_count(3);
        assert_eq!(unit.notes(), "(3 files)");

        let empty = unit.with_file_count(0);
        assert_eq!(empty.notes(), "");
    }
}
