//! Path algebra for the build pipeline.
//!
//! Relative paths produced here always use `/` separators: they end up in
//! source maps, log lines and generated text, where a Windows backslash
//! would be wrong.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Path resolution errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Path is outside of the defined root: `{0}`")]
    EscapesRoot(String),
}

/// Lexically normalize a path, dropping `.` and folding `name/..` pairs.
///
/// Nothing touches the disk, so symlinks are not resolved.
///
/// # Errors
/// Returns [`PathError::EscapesRoot`] if a `..` climbs above the start of a
/// relative path or above the root of an absolute one.
pub fn normalize(path: &Path) -> Result<PathBuf, PathError> {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                _ => return Err(PathError::EscapesRoot(path.display().to_string())),
            },
            other => parts.push(other),
        }
    }

    Ok(parts.iter().collect())
}

/// Resolve `file` against `dir` and normalize the result.
///
/// An absolute `file` ignores `dir`, matching `Path::join`.
pub fn resolve(dir: &Path, file: impl AsRef<Path>) -> Result<PathBuf, PathError> {
    normalize(&dir.join(file))
}

/// Relative path leading from directory `from` to `to`.
///
/// Returns an empty string when both paths are the same.
///
/// # Examples
/// ```ignore
/// rel_path("/site/build/css", "/site/src") // → "../../src"
/// rel_path("/site", "/site/build/app.js")  // → "build/app.js"
/// ```
pub fn rel_path(from: &Path, to: &Path) -> String {
    let from: Vec<_> = significant(from).collect();
    let to: Vec<_> = significant(to).collect();

    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts = vec![String::from(".."); from.len() - common];
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

/// Like [`rel_path`], with a trailing `/` to mark a directory in messages.
pub fn rel_dir_path(from: &Path, to: &Path) -> String {
    format!("{}/", rel_path(from, to))
}

/// Render a relative path with `/` separators.
pub fn slashed(path: &Path) -> String {
    significant(path)
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Strip trailing `/` and `\` from a configured path string.
pub fn trim_separators(path: &str) -> &str {
    path.trim_end_matches(['/', '\\'])
}

/// Strip an ASCII `suffix` from `name`, ignoring case.
///
/// ```ignore
/// strip_suffix_ignore_case("App.COFFEE", ".coffee") // → Some("App")
/// ```
pub fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(suffix.len())?;
    let (stem, tail) = (name.get(..split)?, name.get(split..)?);
    tail.eq_ignore_ascii_case(suffix).then_some(stem)
}

fn significant(path: &Path) -> impl Iterator<Item = Component<'_>> {
    path.components().filter(|c| !matches!(c, Component::CurDir))
}
