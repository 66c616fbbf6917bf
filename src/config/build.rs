//! Resolved per-group build settings.
//!
//! [`GroupConfig`] is what the user wrote; [`BuildConfig`] is what a build
//! runs with: absolute paths, separators trimmed, derived paths filled in.
//! It is created once per group and never changes during the build.

use super::{GroupConfig, Toolchain};
use crate::utils::path::trim_separators;
use std::path::{Path, PathBuf};

/// Name of the scratch cache directory under the project root.
pub const CACHE_DIR: &str = ".awe";
/// Name of the dependency symlink inside the destination.
pub const BOWER_LINK: &str = "_bower";
/// Name of the warning file inside the destination.
pub const WARNING_FILE: &str = "_DO_NOT_EDIT.txt";

/// A dependency directory and the symlink that exposes it in the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BowerLink {
    /// Dependency directory, e.g. `<root>/bower_components`
    pub src: PathBuf,
    /// Symlink to create, `<dest>/_bower`
    pub link: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Group name from `[groups.<name>]`
    pub name: String,
    pub root: PathBuf,
    pub src: PathBuf,
    pub dest: PathBuf,
    /// `<root>/.awe`
    pub cache: PathBuf,
    pub bower: Option<BowerLink>,
    pub warning_file: Option<PathBuf>,
    pub sourcemaps: bool,
    pub pretty_print_sourcemaps: bool,
    /// Accepted for compatibility; only produces a warning
    pub autoprefixer: bool,
    /// Bundled compiler runtime (see [`Toolchain::bundle_dir`])
    pub bundle_dir: PathBuf,
}

impl BuildConfig {
    pub fn new(root: &Path, name: &str, group: &GroupConfig, toolchain: &Toolchain) -> Self {
        let root = absolute(root);
        let src = join_trimmed(&root, &group.src);
        let dest = join_trimmed(&root, &group.dest);

        let bower = group.bower.as_ref().map(|bower| BowerLink {
            src: join_trimmed(&root, bower),
            link: dest.join(BOWER_LINK),
        });
        let warning_file = group.warningfile.then(|| dest.join(WARNING_FILE));

        Self {
            name: name.to_owned(),
            cache: root.join(CACHE_DIR),
            bower,
            warning_file,
            sourcemaps: group.sourcemaps,
            pretty_print_sourcemaps: group.pretty_print_sourcemaps,
            autoprefixer: group.autoprefixer,
            bundle_dir: toolchain.bundle_dir.clone(),
            root,
            src,
            dest,
        }
    }
}

/// `root/path` with trailing separators of `path` removed.
fn join_trimmed(root: &Path, path: &Path) -> PathBuf {
    root.join(trim_separators(&path.to_string_lossy()))
}

/// Absolute form of `path`, canonical when it exists.
fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

/// A group rooted at `root` with `src/` and `build/`, no extras.
#[cfg(test)]
pub fn test_config(root: &Path) -> BuildConfig {
    BuildConfig {
        name: "test".into(),
        root: root.to_path_buf(),
        src: root.join("src"),
        dest: root.join("build"),
        cache: root.join(CACHE_DIR),
        bower: None,
        warning_file: None,
        sourcemaps: false,
        pretty_print_sourcemaps: false,
        autoprefixer: false,
        bundle_dir: root.join("runtime").join("ruby_bundle"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolsConfig;

    fn toolchain() -> Toolchain {
        Toolchain::resolve(
            &ToolsConfig {
                runtime: Some("/opt/awe-missing".into()),
                ..Default::default()
            },
            Path::new("/"),
        )
    }

    #[test]
    fn test_new_trims_and_joins() {
        let group = GroupConfig {
            src: "assets/src//".into(),
            dest: "assets/build/".into(),
            bower: Some("bower_components/".into()),
            ..Default::default()
        };
        let config = BuildConfig::new(Path::new("/site-missing"), "theme", &group, &toolchain());

        assert_eq!(config.name, "theme");
        assert_eq!(config.root, PathBuf::from("/site-missing"));
        assert_eq!(config.src, PathBuf::from("/site-missing/assets/src"));
        assert_eq!(config.dest, PathBuf::from("/site-missing/assets/build"));
        assert_eq!(config.cache, PathBuf::from("/site-missing/.awe"));
        assert_eq!(
            config.bower,
            Some(BowerLink {
                src: "/site-missing/bower_components".into(),
                link: "/site-missing/assets/build/_bower".into(),
            })
        );
        assert_eq!(
            config.warning_file,
            Some(PathBuf::from("/site-missing/assets/build/_DO_NOT_EDIT.txt"))
        );
        assert_eq!(config.bundle_dir, PathBuf::from("/opt/awe-missing/ruby_bundle"));
    }

    #[test]
    fn test_new_without_extras() {
        let group = GroupConfig {
            warningfile: false,
            sourcemaps: true,
            ..Default::default()
        };
        let config = BuildConfig::new(Path::new("/site-missing"), "main", &group, &toolchain());

        assert!(config.bower.is_none());
        assert!(config.warning_file.is_none());
        assert!(config.sourcemaps);
        assert!(!config.pretty_print_sourcemaps);
    }

    #[test]
    fn test_new_canonicalizes_existing_root() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("site");
        std::fs::create_dir(&nested).unwrap();

        let config = BuildConfig::new(
            &nested.join("../site"),
            "main",
            &GroupConfig::default(),
            &toolchain(),
        );
        assert_eq!(config.root, nested.canonicalize().unwrap());
    }
}
