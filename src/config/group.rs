//! `[groups.<name>]` section configuration.
//!
//! One table per asset group. Paths are relative to the project root.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[groups.<name>]` section in awe.toml - one source tree and its output.
///
/// # Example
/// ```toml
/// [groups.theme]
/// src = "assets/src"             # Source directory
/// dest = "assets/build"          # Destination directory (emptied on build)
/// bower = "bower_components"     # Linked as `<dest>/_bower`
/// sourcemaps = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    /// Source directory.
    #[serde(default = "defaults::group::src")]
    #[educe(Default = defaults::group::src())]
    pub src: PathBuf,

    /// Destination directory. Everything in it is replaced on each build.
    #[serde(default = "defaults::group::dest")]
    #[educe(Default = defaults::group::dest())]
    pub dest: PathBuf,

    /// Dependency directory to link into the destination.
    #[serde(
        default = "defaults::group::bower",
        skip_serializing_if = "Option::is_none"
    )]
    #[educe(Default = defaults::group::bower())]
    pub bower: Option<PathBuf>,

    /// Write `_DO_NOT_EDIT.txt` into the destination.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub warningfile: bool,

    /// Write `.map` files next to compiled output.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub sourcemaps: bool,

    /// Indent `.map` files.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub pretty_print_sourcemaps: bool,

    /// Accepted for compatibility; has no effect.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub autoprefixer: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_defaults() {
        let group: GroupConfig = toml::from_str("").unwrap();
        assert_eq!(group, GroupConfig::default());
        assert_eq!(group.src, PathBuf::from("src"));
        assert_eq!(group.dest, PathBuf::from("build"));
        assert!(group.warningfile);
        assert!(!group.sourcemaps);
        assert!(group.bower.is_none());
    }

    #[test]
    fn test_group_full() {
        let group: GroupConfig = toml::from_str(
            r#"
            src = "assets/src/"
            dest = "assets/build"
            bower = "bower_components"
            warningfile = false
            sourcemaps = true
            pretty_print_sourcemaps = true
            autoprefixer = true
            "#,
        )
        .unwrap();

        assert_eq!(group.src, PathBuf::from("assets/src/"));
        assert_eq!(group.bower, Some(PathBuf::from("bower_components")));
        assert!(!group.warningfile);
        assert!(group.sourcemaps);
        assert!(group.pretty_print_sourcemaps);
    }

    #[test]
    fn test_group_rejects_unknown_fields() {
        let result: Result<GroupConfig, _> = toml::from_str("sourcemap = true");
        assert!(result.is_err());
    }
}
