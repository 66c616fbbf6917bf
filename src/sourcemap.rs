//! Source map documents.
//!
//! Maps come from the external compilers, get their `sources` rewritten as
//! the file moves through the pipeline, and are written next to the output
//! file as `<file>.map`. Every rewrite consumes the document and returns a
//! new one; `sources` and `sourcesContent` stay the same length.
//!
//! # Pipeline
//!
//! ```text
//! SourceMap::parse()
//!     │
//!     ├── map_sources()             (stylesheets: scratch dir → source dir)
//!     ├── with_source_root()        (relative path back to the source tree)
//!     ├── inline_content()          (sourcesContent from the source tree)
//!     ├── rewrite_synthetic_paths() (bundled runtime → `_awe/ruby_bundle`)
//!     │
//!     └── to_vec()                  (written to `<file>.map`)
//! ```

use crate::utils::path::{resolve, slashed};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{
    Map, Value,
    ser::{PrettyFormatter, Serializer},
};
use std::{
    path::Path,
    sync::OnceLock,
};

/// Label that replaces paths into the bundled compiler runtime.
pub const SYNTHETIC_BUNDLE_ROOT: &str = "_awe/ruby_bundle";

/// A version 3 source map.
///
/// Fields this pipeline never touches are kept in `extra` and written back
/// verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,

    #[serde(default)]
    pub sources: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources_content: Vec<Option<String>>,

    #[serde(default)]
    pub names: Vec<String>,

    #[serde(default)]
    pub mappings: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const fn default_version() -> u32 {
    3
}

impl SourceMap {
    /// Parse a source map from JSON text.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Serialize to JSON. Slashes are never escaped; pretty output uses a
    /// four-space indent.
    pub fn to_vec(&self, pretty: bool) -> Result<Vec<u8>, serde_json::Error> {
        if !pretty {
            return serde_json::to_vec(self);
        }

        let mut buf = Vec::new();
        let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut serializer)?;
        Ok(buf)
    }

    /// Rewrite every entry of `sources`.
    pub fn map_sources(mut self, mut f: impl FnMut(&str) -> String) -> Self {
        self.sources = self.sources.iter().map(|source| f(source)).collect();
        self
    }

    /// Set `sourceRoot`.
    pub fn with_source_root(mut self, root: impl Into<String>) -> Self {
        self.source_root = Some(root.into());
        self
    }

    /// Fill `sourcesContent` with the content of each source, read relative
    /// to `src_root`. Windows line endings are normalized to `\n`.
    pub fn inline_content(mut self, src_root: &Path, mut read: impl FnMut(&Path) -> String) -> Self {
        self.sources_content = self
            .sources
            .iter()
            .map(|source| Some(read(&src_root.join(source)).replace("\r\n", "\n")))
            .collect();
        self
    }

    /// Replace sources that resolve into `bundle_dir` with a short label
    /// under [`SYNTHETIC_BUNDLE_ROOT`].
    ///
    /// Must run after [`inline_content`](Self::inline_content), which still
    /// needs the real paths.
    pub fn rewrite_synthetic_paths(self, src_root: &Path, bundle_dir: &Path) -> Self {
        self.map_sources(|source| {
            let synthetic = resolve(src_root, source).ok().and_then(|abs| {
                abs.strip_prefix(bundle_dir)
                    .ok()
                    .map(|rest| format!("{SYNTHETIC_BUNDLE_ROOT}/{}", slashed(rest)))
            });
            synthetic.unwrap_or_else(|| source.to_owned())
        })
    }
}

// ============================================================================
// Trailing Comments
// ============================================================================

/// Comment style used to reference the map from the compiled file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentSyntax {
    /// `//# sourceMappingURL=...` (JavaScript)
    Line,
    /// `/*# sourceMappingURL=... */` (CSS)
    Block,
}

impl CommentSyntax {
    /// Pick the syntax from the output file extension (case-insensitive).
    ///
    /// Returns `None` for anything other than `.js` and `.css`.
    pub fn for_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        if name.ends_with(".js") {
            Some(Self::Line)
        } else if name.ends_with(".css") {
            Some(Self::Block)
        } else {
            None
        }
    }
}

/// Append a comment pointing at `map_filename`.
pub fn append_comment(text: &str, map_filename: &str, syntax: CommentSyntax) -> String {
    match syntax {
        CommentSyntax::Line => format!("{text}\n//# sourceMappingURL={map_filename}\n"),
        CommentSyntax::Block => format!("{text}\n/*# sourceMappingURL={map_filename} */\n"),
    }
}

/// Remove a trailing `sourceMappingURL` comment of either syntax, together
/// with one line break before and after it.
///
/// Exact inverse of [`append_comment`].
pub fn strip_trailing_comment(text: &str) -> &str {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(
            r"\n?(?://# sourceMappingURL=[^ \t\r\n]+|/\*# sourceMappingURL=[^ \t\r\n]+ \*/)[ \t]*(?:\r?\n)?$",
        )
        .unwrap()
    });

    match re.find(text) {
        Some(m) => &text[..m.start()],
        None => text,
    }
}
