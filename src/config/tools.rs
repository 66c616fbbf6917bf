//! `[tools]` section configuration and the resolved toolchain.

use super::defaults::{self, tools::RUBY_BUNDLE};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// `[tools]` section in awe.toml - where the external compilers live.
///
/// # Example
/// ```toml
/// [tools]
/// runtime = "/opt/awe/runtime"   # holds node/, node_modules/ and ruby_bundle/
/// compass = ["compass"]          # use a system Compass instead
/// timeout = 120
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// Runtime directory (default: `runtime/` next to the executable).
    #[serde(
        default = "defaults::tools::runtime",
        skip_serializing_if = "Option::is_none"
    )]
    #[educe(Default = defaults::tools::runtime())]
    pub runtime: Option<PathBuf>,

    /// CoffeeScript command and leading arguments.
    #[serde(
        default = "defaults::tools::command",
        skip_serializing_if = "Option::is_none"
    )]
    #[educe(Default = defaults::tools::command())]
    pub coffee: Option<Vec<String>>,

    /// Compass command and leading arguments.
    #[serde(
        default = "defaults::tools::command",
        skip_serializing_if = "Option::is_none"
    )]
    #[educe(Default = defaults::tools::command())]
    pub compass: Option<Vec<String>>,

    /// Seconds a single compiler run may take.
    #[serde(default = "defaults::tools::timeout")]
    #[educe(Default = defaults::tools::timeout())]
    pub timeout: u64,
}

/// Compiler commands with every default filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub runtime: PathBuf,
    /// Bundled Ruby runtime; map sources inside it get a synthetic name
    pub bundle_dir: PathBuf,
    pub coffee: Vec<String>,
    pub compass: Vec<String>,
    pub timeout: Duration,
}

impl Toolchain {
    /// Fill in defaults. A relative `runtime` is taken from `root`.
    pub fn resolve(tools: &ToolsConfig, root: &Path) -> Self {
        let runtime = match &tools.runtime {
            Some(dir) => root.join(dir),
            None => default_runtime(root),
        };
        let runtime = runtime.canonicalize().unwrap_or(runtime);

        let coffee = tools.coffee.clone().unwrap_or_else(|| {
            vec![
                path_arg(&runtime.join("node_modules").join(".bin").join("coffee")),
                path_arg(&runtime.join("node").join("compile-coffeescript.coffee")),
            ]
        });
        let compass = tools
            .compass
            .clone()
            .unwrap_or_else(|| vec![path_arg(&runtime.join(RUBY_BUNDLE).join("bin").join("compass"))]);

        Self {
            bundle_dir: runtime.join(RUBY_BUNDLE),
            runtime,
            coffee,
            compass,
            timeout: Duration::from_secs(tools.timeout),
        }
    }

    /// Configured programs that cannot be found.
    pub fn missing(&self) -> Vec<&str> {
        [&self.coffee, &self.compass]
            .into_iter()
            .filter_map(|command| command.first())
            .filter(|program| which::which(program.as_str()).is_err())
            .map(String::as_str)
            .collect()
    }
}

/// `runtime/` next to the running executable.
fn default_runtime(root: &Path) -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("runtime")))
        .unwrap_or_else(|| root.join("runtime"))
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
