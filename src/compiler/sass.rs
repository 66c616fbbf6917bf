//! Sass compiler, driven through Compass.
//!
//! Compass cannot take every option on the command line, so each run writes a
//! `config.rb` into a scratch workspace and points the CSS output (and any
//! generated sprites) at the scratch directory. The stylesheet is then read
//! back from there, and the workspace is handed to the build so it can copy
//! the `_generated` side files into the destination.
//!
//! # Scratch layout
//!
//! ```text
//! <scratch>/
//! ├── <path below src>.css       (compiled stylesheet)
//! ├── <path below src>.css.map   (when source maps are on)
//! └── _generated/                (sprites and other side files)
//! ```

use super::{CompileError, CompileJob, Compiled, Compiler, GENERATED_DIR, Process, ProcessOutput};
use crate::{
    build::BuildUnit,
    config::BuildConfig,
    output::Action,
    scratch::ScratchWorkspace,
    sourcemap::{SourceMap, strip_trailing_comment},
    utils::path::{normalize, rel_path, strip_suffix_ignore_case},
};
use regex::Regex;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    sync::OnceLock,
    time::Duration,
};

/// URL prefix Compass writes for generated asset references.
pub const DEST_ROOT_PLACEHOLDER: &str = "/AWEDESTROOTPATH";

/// Label prefix for errors reported by this compiler
const LABEL: &str = "Sass/Compass";

#[derive(Debug, Clone)]
pub struct SassCompiler {
    command: Vec<String>,
    timeout: Duration,
}

impl SassCompiler {
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self { command, timeout }
    }
}

impl Compiler for SassCompiler {
    fn compile(&self, job: &CompileJob<'_>) -> Result<Compiled, CompileError> {
        let config = job.config;

        let mut workspace = ScratchWorkspace::new().map_err(CompileError::Scratch)?;
        let compass_config = compass_config(config, workspace.path());
        let config_file = workspace
            .file(".rb", compass_config.as_bytes())
            .map_err(CompileError::Scratch)?;

        let args: [OsString; 5] = [
            "compile".into(),
            "--trace".into(),
            "--config".into(),
            config_file.into(),
            job.src.into(),
        ];
        let output = Process::new(&self.command, &args)?
            .current_dir(&config.root)
            .merge_stderr()
            .timeout(Some(self.timeout))
            .run()?;

        if !output.success() {
            return Err(diagnostics(&output));
        }

        let css_file = output_path(config, job.src, workspace.path());
        let content = job.fs.read(&css_file)?;

        let mut map_file = css_file.clone().into_os_string();
        map_file.push(".map");
        let map_file = PathBuf::from(map_file);

        // Without a map file the stylesheet is still built, just unmapped
        let unit = if config.sourcemaps && job.fs.exists(&map_file) {
            let map_text = job.fs.read(&map_file)?;

            // Sources are relative to the scratch copy; make them relative
            // to the real source directory
            let css_dir = css_file.parent().unwrap_or(workspace.path());
            let src_root = config.src.canonicalize().unwrap_or_else(|_| config.src.clone());
            let map = SourceMap::parse(&String::from_utf8_lossy(&map_text))?
                .map_sources(|source| rel_path(&src_root, &absolute_source(css_dir, source)));

            // Re-added once after any concatenation
            let css = strip_compiler_comment(&String::from_utf8_lossy(&content));
            BuildUnit::new(css, job.dest).with_source_map(Some(map))
        } else {
            BuildUnit::new(content, job.dest)
        };

        Ok(Compiled {
            unit: unit.with_action(Action::Compiled),
            workspace: Some(workspace),
        })
    }
}

/// Drop the mapping comment Compass appends, together with the line breaks
/// around it, leaving the stylesheet ending in exactly one newline.
fn strip_compiler_comment(css: &str) -> String {
    let stripped = strip_trailing_comment(css);
    if stripped.len() == css.len() {
        return css.to_owned();
    }
    format!("{}\n", stripped.trim_end_matches(['\r', '\n']))
}

/// Where Compass writes the stylesheet compiled from `src`.
fn output_path(config: &BuildConfig, src: &Path, out_dir: &Path) -> PathBuf {
    let rel = rel_path(&config.src, src);
    let stem = strip_suffix_ignore_case(&rel, ".scss").unwrap_or(&rel);
    out_dir.join(format!("{stem}.css"))
}

/// Resolve a map source against the directory of the compiled file.
fn absolute_source(dir: &Path, source: &str) -> PathBuf {
    let joined = dir.join(source);
    joined
        .canonicalize()
        .or_else(|_| normalize(&joined))
        .unwrap_or(joined)
}

/// Turn a failed run into a diagnostic, without Compass's trailing hint.
fn diagnostics(output: &ProcessOutput) -> CompileError {
    static NOISE: OnceLock<Regex> = OnceLock::new();
    let re = NOISE.get_or_init(|| Regex::new(r"[ \t\r\n]*Use --trace for backtrace\.").unwrap());

    let text = String::from_utf8_lossy(&output.stdout);
    let label = match output.code {
        Some(code) => format!("{LABEL} (exit {code})"),
        None => format!("{LABEL} (killed)"),
    };

    CompileError::Diagnostics {
        label,
        message: re.replace_all(&text, "").into_owned(),
    }
}

/// Render the Compass `config.rb` for one run.
fn compass_config(config: &BuildConfig, out_dir: &Path) -> String {
    let src = &config.src;
    let generated = out_dir.join(GENERATED_DIR);
    let placeholder = DEST_ROOT_PLACEHOLDER;

    format!(
        "\
project_path = {root}
cache_path   = {cache}
output_style = :expanded

# Input
sass_path        =  {sass}
images_path      =  {images}
fonts_path       =  {fonts}
sprite_load_path << {sprites}

# Output goes to scratch so generated files can be collected
css_path              = {css}
generated_images_path = {generated}
javascripts_path      = {generated}

# URLs are written against a placeholder root
http_path                  = '{placeholder}'
http_stylesheets_path      = '{placeholder}'
http_images_path           = '{placeholder}/img'
http_fonts_path            = '{placeholder}/fonts'
http_generated_images_path = '{placeholder}/{GENERATED_DIR}'
http_javascripts_path      = '{placeholder}/{GENERATED_DIR}'

asset_cache_buster :none

line_comments = false
sourcemap = {sourcemap}
",
        root = ruby_str(&config.root),
        cache = ruby_str(&config.cache.join("sass-cache")),
        sass = ruby_str(src),
        images = ruby_str(&src.join("img")),
        fonts = ruby_str(&src.join("fonts")),
        sprites = ruby_str(&src.join("_sprites")),
        css = ruby_str(out_dir),
        generated = ruby_str(&generated),
        sourcemap = config.sourcemaps,
    )
}

/// Single-quoted Ruby string literal.
fn ruby_str(path: &Path) -> String {
    let text = path.to_string_lossy();
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}
