//! CoffeeScript compiler.
//!
//! The compile script reads the source on stdin and takes two arguments: the
//! source path relative to the source root (used in the map's `sources`) and
//! the output file name. Compiled JavaScript comes back on stdout, the map
//! on descriptor 3 and diagnostics on stderr.

use super::{CompileError, CompileJob, Compiled, Compiler, Process};
use crate::{build::BuildUnit, output::Action, sourcemap::SourceMap, utils::path::rel_path};
use std::{ffi::OsString, time::Duration};

/// Label for errors reported by this compiler
const LABEL: &str = "CoffeeScript";

#[derive(Debug, Clone)]
pub struct CoffeeCompiler {
    command: Vec<String>,
    timeout: Duration,
}

impl CoffeeCompiler {
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self { command, timeout }
    }
}

impl Compiler for CoffeeCompiler {
    fn compile(&self, job: &CompileJob<'_>) -> Result<Compiled, CompileError> {
        let config = job.config;
        let source = job.fs.read(job.src)?;

        let rel_src = rel_path(&config.src, job.src);
        let dest_name = job
            .dest
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();

        let output = Process::new(&self.command, &[OsString::from(rel_src), dest_name])?
            .current_dir(&config.root)
            .stdin(source)
            .with_aux()
            .timeout(Some(self.timeout))
            .run()?;

        // Anything on stderr is a failure, whatever the exit code says
        if !output.stderr.is_empty() {
            return Err(CompileError::Diagnostics {
                label: LABEL.into(),
                message: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let source_map = if config.sourcemaps && !output.aux.trim_ascii().is_empty() {
            Some(SourceMap::parse(&String::from_utf8_lossy(&output.aux))?)
        } else {
            None
        };

        Ok(BuildUnit::new(output.stdout, job.dest)
            .with_action(Action::Compiled)
            .with_source_map(source_map)
            .into())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::{
        config::test_config,
        fs::{FileSystem, LocalFs},
    };
    use tempfile::tempdir;

    /// Stand-in compiler script, called with the relative source as `$1`
    /// and the output name as `$2`.
    fn fake(script: &str) -> CoffeeCompiler {
        CoffeeCompiler::new(
            vec!["sh".into(), "-c".into(), script.into(), "coffee".into()],
            Duration::from_secs(10),
        )
    }

    const OK_SCRIPT: &str = r#"
        tr a-z A-Z
        printf '{"version":3,"file":"%s","sources":["%s"],"names":[],"mappings":"AAAA"}' "$2" "$1" >&3
    "#;

    #[test]
    fn test_compile_success() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.sourcemaps = true;
        let src = config.src.join("lib/app.coffee");
        let dest = config.dest.join("lib/app.js");
        LocalFs.write(&src, b"x = 1\n").unwrap();

        let compiled = fake(OK_SCRIPT)
            .compile(&CompileJob {
                src: &src,
                dest: &dest,
                config: &config,
                fs: &LocalFs,
            })
            .unwrap();

        let unit = compiled.unit;
        assert_eq!(unit.content, b"X = 1\n");
        assert_eq!(unit.dest, dest);
        assert_eq!(unit.action, Some(Action::Compiled));

        let map = unit.source_map.unwrap();
        assert_eq!(map.sources, vec!["lib/app.coffee"]);
        assert_eq!(map.file.as_deref(), Some("app.js"));
        assert!(compiled.workspace.is_none());
    }

    #[test]
    fn test_map_ignored_when_disabled() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let src = config.src.join("app.coffee");
        LocalFs.write(&src, b"x = 1").unwrap();

        let compiled = fake(OK_SCRIPT)
            .compile(&CompileJob {
                src: &src,
                dest: &config.dest.join("app.js"),
                config: &config,
                fs: &LocalFs,
            })
            .unwrap();

        assert!(compiled.unit.source_map.is_none());
    }

    #[test]
    fn test_stderr_is_failure_even_on_success_exit() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let src = config.src.join("app.coffee");
        LocalFs.write(&src, b"x = ->").unwrap();

        let err = fake("cat >/dev/null; echo 'error: unexpected end of input' >&2; exit 0")
            .compile(&CompileJob {
                src: &src,
                dest: &config.dest.join("app.js"),
                config: &config,
                fs: &LocalFs,
            })
            .unwrap_err();

        assert_eq!(err.label(), Some("CoffeeScript"));
        assert_eq!(err.message(), "error: unexpected end of input\n");
    }

    #[test]
    fn test_invalid_map() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.sourcemaps = true;
        let src = config.src.join("app.coffee");
        LocalFs.write(&src, b"x = 1").unwrap();

        let err = fake("cat; echo 'not json' >&3")
            .compile(&CompileJob {
                src: &src,
                dest: &config.dest.join("app.js"),
                config: &config,
                fs: &LocalFs,
            })
            .unwrap_err();

        assert!(matches!(err, CompileError::SourceMap(_)));
    }

    #[test]
    fn test_missing_source() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());

        let err = fake("cat")
            .compile(&CompileJob {
                src: &config.src.join("missing.coffee"),
                dest: &config.dest.join("missing.js"),
                config: &config,
                fs: &LocalFs,
            })
            .unwrap_err();

        assert!(matches!(err, CompileError::Fs(_)));
    }
}
