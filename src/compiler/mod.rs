//! External compilers.
//!
//! Each compiler turns one source file into a [`BuildUnit`] by running an
//! external process:
//!
//! - **coffee**: `.coffee` → `.js`, source map on an extra descriptor
//! - **sass**: `.scss` → `.css` through Compass, output via a scratch workspace
//! - **process**: the process runner both are built on
//!
//! The build holds them behind the [`Compiler`] trait and never knows which
//! program is behind it.

mod coffee;
mod error;
mod process;
mod sass;

pub use coffee::CoffeeCompiler;
pub use error::CompileError;
pub use process::{Process, ProcessOutput};
pub use sass::SassCompiler;

use crate::{
    build::BuildUnit, config::BuildConfig, config::Toolchain, fs::FileSystem,
    scratch::ScratchWorkspace,
};
use std::path::Path;

/// Name of the side-file directory inside a compiler's scratch workspace and
/// inside the destination.
pub const GENERATED_DIR: &str = "_generated";

/// One file to compile.
pub struct CompileJob<'a> {
    /// Absolute source file
    pub src: &'a Path,
    /// Absolute destination file, already renamed for the output type
    pub dest: &'a Path,
    pub config: &'a BuildConfig,
    pub fs: &'a dyn FileSystem,
}

/// A successful compile.
#[derive(Debug)]
pub struct Compiled {
    pub unit: BuildUnit,
    /// Scratch output kept alive until its [`GENERATED_DIR`] subtree has
    /// been copied into the destination
    pub workspace: Option<ScratchWorkspace>,
}

impl From<BuildUnit> for Compiled {
    fn from(unit: BuildUnit) -> Self {
        Self {
            unit,
            workspace: None,
        }
    }
}

/// Turns one source file into compiled output.
pub trait Compiler {
    fn compile(&self, job: &CompileJob<'_>) -> Result<Compiled, CompileError>;
}

/// The compilers a build dispatches to.
pub struct Compilers {
    /// `.coffee` files
    pub scripts: Box<dyn Compiler>,
    /// `.scss` files
    pub styles: Box<dyn Compiler>,
}

impl Compilers {
    pub fn from_toolchain(toolchain: &Toolchain) -> Self {
        Self {
            scripts: Box::new(CoffeeCompiler::new(
                toolchain.coffee.clone(),
                toolchain.timeout,
            )),
            styles: Box::new(SassCompiler::new(
                toolchain.compass.clone(),
                toolchain.timeout,
            )),
        }
    }
}
