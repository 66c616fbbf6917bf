//! Asset group build.
//!
//! Mirrors a source tree into its destination, one entry at a time:
//!
//! - `_name`: partial, skipped
//! - `name.coffee` / `name.scss`: compiled to `name.js` / `name.css`
//! - `name.js/` / `name.css/`: bundle, children concatenated into one file
//! - other directories: recursed into
//! - other files: copied unchanged
//!
//! # Build Flow
//!
//! ```text
//! build()
//!   ├── prepare_cache()          <root>/.awe
//!   ├── prepare_destination()    emptied | created
//!   ├── link_bower()             <dest>/_bower → dependency directory
//!   ├── write_warning_file()     <dest>/_DO_NOT_EDIT.txt
//!   └── build_regular_directory(src, dest)
//!         ├── compile_file()       ──► write()
//!         └── compile_directory()  ──► write()
//! ```
//!
//! Nothing here returns an error for a single file: failures go to the
//! [`BuildOutput`] and the walk moves on to the next entry.

mod error;
mod unit;

pub use error::BuildError;
pub use unit::BuildUnit;

use crate::{
    compiler::{CompileJob, Compiled, Compiler, Compilers, GENERATED_DIR},
    config::{BowerLink, BuildConfig},
    fs::FileSystem,
    output::{Action, BuildOutput},
    sourcemap::{CommentSyntax, append_comment},
    utils::{
        error_chain,
        path::{rel_dir_path, rel_path, strip_suffix_ignore_case},
        sort::sort_natural,
    },
};
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

/// Content of `<root>/.awe/.gitignore`.
const CACHE_IGNORE: &str = "# Automatically generated by Awe - ignore all files\n*\n";

/// Template for the destination's warning file; `{source}` is the path back
/// to the source directory.
const WARNING_TEMPLATE: &str = include_str!("../embed/do_not_edit.txt");

/// Suffixes that mark a directory as a bundle.
const BUNDLE_SUFFIXES: [&str; 2] = [".css", ".js"];

/// Builds one asset group.
pub struct AssetBuilder<'a> {
    config: &'a BuildConfig,
    fs: &'a dyn FileSystem,
    output: &'a dyn BuildOutput,
    compilers: &'a Compilers,
}

impl<'a> AssetBuilder<'a> {
    pub fn new(
        config: &'a BuildConfig,
        fs: &'a dyn FileSystem,
        output: &'a dyn BuildOutput,
        compilers: &'a Compilers,
    ) -> Self {
        Self {
            config,
            fs,
            output,
            compilers,
        }
    }

    /// Build the whole group.
    ///
    /// Every problem is reported to the output; a failure while preparing
    /// the destination stops the build, a failure on one file does not.
    pub fn build(&self) {
        if let Err(err) = self.try_build() {
            let path = err.path().unwrap_or(&self.config.dest);
            self.output
                .error(&rel_path(&self.config.root, path), None, &error_chain(&err));
        }
    }

    fn try_build(&self) -> Result<(), BuildError> {
        let config = self.config;

        if !self.fs.exists(&config.src) {
            let path = rel_dir_path(&config.root, &config.src);
            self.output
                .error(&path, None, "Source directory doesn't exist");
            return Ok(());
        }

        self.prepare_cache()?;
        self.prepare_destination()?;
        self.link_bower()?;
        self.write_warning_file()?;

        self.build_regular_directory(&config.src, &config.dest);
        Ok(())
    }

    // ========================================================================
    // Setup
    // ========================================================================

    fn prepare_cache(&self) -> Result<(), BuildError> {
        let cache = &self.config.cache;
        if !self.fs.exists(cache) {
            self.fs.create_dir_all(cache)?;
        }
        self.fs
            .write(&cache.join(".gitignore"), CACHE_IGNORE.as_bytes())?;
        Ok(())
    }

    /// Always start from an empty destination.
    fn prepare_destination(&self) -> Result<(), BuildError> {
        let dest = &self.config.dest;
        let path = rel_dir_path(&self.config.root, dest);

        if self.fs.exists(dest) {
            self.fs.clean_dir(dest)?;
            self.output.report(Action::Emptied, &path, "");
        } else {
            self.fs.create_dir_all(dest)?;
            self.output.report(Action::Created, &path, "");
        }
        Ok(())
    }

    /// Link the dependency directory into the destination. Skipped without
    /// a word when the dependencies are not installed.
    fn link_bower(&self) -> Result<(), BuildError> {
        let Some(BowerLink { src, link }) = &self.config.bower else {
            return Ok(());
        };
        if !self.fs.exists(src) {
            return Ok(());
        }

        let link_dir = link.parent().unwrap_or(&self.config.dest);
        let target = rel_path(link_dir, src);
        self.fs.symlink(Path::new(&target), link)?;
        Ok(())
    }

    fn write_warning_file(&self) -> Result<(), BuildError> {
        let Some(file) = &self.config.warning_file else {
            return Ok(());
        };

        let source = rel_path(&self.config.dest, &self.config.src);
        let content = WARNING_TEMPLATE.replace("{source}", &source);
        self.write(BuildUnit::new(content, file).with_action(Action::Generated))
    }

    // ========================================================================
    // Tree Walk
    // ========================================================================

    /// Child names of `dir`, in case-insensitive natural order.
    fn read_directory(&self, dir: &Path) -> Option<Vec<String>> {
        match self.fs.list(dir) {
            Ok(mut names) => {
                sort_natural(&mut names);
                Some(names)
            }
            Err(err) => {
                self.report_error(&err.path, None, &error_chain(&err));
                None
            }
        }
    }

    fn build_regular_directory(&self, src: &Path, dest: &Path) {
        if !self.fs.exists(dest)
            && let Err(err) = self.fs.create_dir_all(dest)
        {
            self.report_error(dest, None, &error_chain(&err));
            return;
        }

        let Some(names) = self.read_directory(src) else {
            return;
        };

        for name in names.iter().filter(|name| !is_partial(name)) {
            self.build_file_or_directory(&src.join(name), &dest.join(name));
        }
    }

    fn build_file_or_directory(&self, src: &Path, dest: &Path) {
        let unit = if !self.fs.is_dir(src) {
            self.compile_file(src, dest)
        } else if is_bundle(src) {
            self.compile_directory(src, dest)
        } else {
            self.build_regular_directory(src, dest);
            return;
        };

        if let Some(unit) = unit {
            self.write_reported(unit);
        }
    }

    /// Compile or copy a single file. `None` when it failed (already
    /// reported).
    fn compile_file(&self, src: &Path, dest: &Path) -> Option<BuildUnit> {
        let name = file_name(src);

        let (compiler, dest): (&dyn Compiler, PathBuf) =
            if strip_suffix_ignore_case(&name, ".coffee").is_some() {
                (self.compilers.scripts.as_ref(), replace_suffix(dest, ".coffee", ".js"))
            } else if strip_suffix_ignore_case(&name, ".scss").is_some() {
                (self.compilers.styles.as_ref(), replace_suffix(dest, ".scss", ".css"))
            } else {
                return self.copy_file(src, dest);
            };

        let job = CompileJob {
            src,
            dest: &dest,
            config: self.config,
            fs: self.fs,
        };

        match compiler.compile(&job) {
            Ok(Compiled { unit, workspace }) => {
                if let Some(workspace) = workspace {
                    self.copy_generated_directory(
                        &workspace.path().join(GENERATED_DIR),
                        &self.config.dest.join(GENERATED_DIR),
                    );
                    if let Err(err) = workspace.close() {
                        self.report_warning(src, Some("scratch"), &err.to_string());
                    }
                }
                Some(unit)
            }
            Err(err) => {
                self.report_error(src, err.label(), &err.message());
                None
            }
        }
    }

    fn copy_file(&self, src: &Path, dest: &Path) -> Option<BuildUnit> {
        match self.fs.read(src) {
            Ok(content) => Some(BuildUnit::new(content, dest).with_action(Action::Copied)),
            Err(err) => {
                self.report_error(src, None, &error_chain(&err));
                None
            }
        }
    }

    /// Concatenate a bundle directory into one unit written to `dest`.
    ///
    /// Each child's content is followed by a newline. Children that fail are
    /// left out; nested directories are concatenated in place, whatever
    /// their name.
    fn compile_directory(&self, src: &Path, dest: &Path) -> Option<BuildUnit> {
        let names = self.read_directory(src)?;

        let mut content = Vec::new();
        let mut file_count = 0;

        for name in names.iter().filter(|name| !is_partial(name)) {
            let child = src.join(name);
            let unit = if self.fs.is_dir(&child) {
                self.compile_directory(&child, dest)
            } else {
                self.compile_file(&child, dest)
            };

            // Skip files with compile errors
            let Some(unit) = unit else {
                continue;
            };

            content.extend_from_slice(&unit.content);
            content.push(b'\n');
            file_count += unit.file_count;
        }

        Some(
            BuildUnit::new(content, dest)
                .with_action(Action::Compiled)
                .with_file_count(file_count),
        )
    }

    /// Copy a compiler's side files into the destination, reporting each as
    /// generated.
    fn copy_generated_directory(&self, src: &Path, dest: &Path) {
        if !self.fs.is_dir(src) {
            return;
        }
        let Some(names) = self.read_directory(src) else {
            return;
        };
        if let Err(err) = self.fs.create_dir_all(dest) {
            self.report_error(dest, None, &error_chain(&err));
            return;
        }

        for name in &names {
            let (src, dest) = (src.join(name), dest.join(name));
            if self.fs.is_dir(&src) {
                self.copy_generated_directory(&src, &dest);
            } else if let Some(unit) = self.copy_file(&src, &dest) {
                self.write_reported(unit.with_action(Action::Generated));
            }
        }
    }

    // ========================================================================
    // Output
    // ========================================================================

    fn write_reported(&self, unit: BuildUnit) {
        let dest = unit.dest.clone();
        if let Err(err) = self.write(unit) {
            let path = err.path().unwrap_or(&dest).to_path_buf();
            self.report_error(&path, None, &error_chain(&err));
        }
    }

    /// Write a unit (and its source map) and report it.
    fn write(&self, unit: BuildUnit) -> Result<(), BuildError> {
        let config = self.config;
        let notes = unit.notes();
        let BuildUnit {
            mut content,
            dest,
            action,
            source_map,
            ..
        } = unit;

        if config.sourcemaps
            && let Some(map) = source_map
        {
            let syntax = CommentSyntax::for_path(&dest)
                .ok_or_else(|| BuildError::UnknownMapTarget(dest.clone()))?;
            let dest_dir = dest.parent().unwrap_or(&config.dest);

            // Inline before rewriting: inlining reads the real paths
            let map = map
                .with_source_root(rel_path(dest_dir, &config.src))
                .inline_content(&config.src, |path| self.read_source(path))
                .rewrite_synthetic_paths(&config.src, &config.bundle_dir);

            let map_name = format!("{}.map", file_name(&dest));
            content = append_comment(&String::from_utf8_lossy(&content), &map_name, syntax)
                .into_bytes();

            self.fs
                .write(&map_path(&dest), &map.to_vec(config.pretty_print_sourcemaps)?)?;
        }

        self.fs.write(&dest, &content)?;

        if let Some(action) = action {
            self.output
                .report(action, &rel_path(&config.root, &dest), &notes);
        }
        Ok(())
    }

    /// Source text for `sourcesContent`; empty (with a warning) when
    /// unreadable.
    fn read_source(&self, path: &Path) -> String {
        match self.fs.read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) => {
                self.report_warning(path, Some("source map"), &error_chain(&err));
                String::new()
            }
        }
    }

    fn report_error(&self, path: &Path, label: Option<&str>, message: &str) {
        self.output
            .error(&rel_path(&self.config.root, path), label, message);
    }

    fn report_warning(&self, path: &Path, label: Option<&str>, message: &str) {
        self.output
            .warning(&rel_path(&self.config.root, path), label, message);
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Names starting with `_` are never built on their own.
fn is_partial(name: &str) -> bool {
    name.starts_with('_')
}

fn is_bundle(dir: &Path) -> bool {
    let name = file_name(dir);
    BUNDLE_SUFFIXES
        .iter()
        .any(|suffix| strip_suffix_ignore_case(&name, suffix).is_some())
}

/// Swap the suffix of `path`'s file name. Paths that do not end in `from`
/// (a bundle child writing to the bundle's name) are returned unchanged.
fn replace_suffix(path: &Path, from: &str, to: &str) -> PathBuf {
    let name = file_name(path);
    match strip_suffix_ignore_case(&name, from) {
        Some(stem) => path.with_file_name(format!("{stem}{to}")),
        None => path.to_path_buf(),
    }
}

/// `<file>.map`
fn map_path(dest: &Path) -> PathBuf {
    let mut path = OsString::from(dest.as_os_str());
    path.push(".map");
    PathBuf::from(path)
}

// ============================================================================
// Tests
// ============================================================================
