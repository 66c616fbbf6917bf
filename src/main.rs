//! Awe - An asset build pipeline for CoffeeScript and Sass.

mod build;
mod cli;
mod compiler;
mod config;
mod fs;
mod init;
mod logger;
mod output;
mod scratch;
mod sourcemap;
mod utils;

use anyhow::{Context, Result, bail};
use build::AssetBuilder;
use clap::Parser;
use cli::{Cli, Commands};
use compiler::Compilers;
use config::{BuildConfig, ProjectConfig};
use fs::LocalFs;
use init::init_config;
use output::ConsoleOutput;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Init => init_config(&cli.root, &cli.config),
        Commands::Build { groups } => {
            let config = load_config(&cli)?;
            build_all(&config, groups)
        }
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<ProjectConfig> {
    let config_path = cli.root.join(&cli.config);
    if !config_path.exists() {
        bail!(
            "Config file `{}` not found. Run `awe init` to create one.",
            config_path.display()
        );
    }

    let config = ProjectConfig::load(&cli.root, &cli.config)?;
    config
        .validate()
        .with_context(|| format!("Invalid config `{}`", config.config_path.display()))?;
    Ok(config)
}

/// Build the selected groups one after another.
///
/// Fails at the end when any file had an error, so every group is still
/// attempted.
fn build_all(config: &ProjectConfig, names: &[String]) -> Result<()> {
    let groups = config.select(names)?;

    let toolchain = config.toolchain();
    for program in toolchain.missing() {
        log!(
            "warning";
            "compiler `{program}` not found (runtime `{}`), files that need it will fail",
            toolchain.runtime.display()
        );
    }

    let compilers = Compilers::from_toolchain(&toolchain);
    let output = ConsoleOutput::default();

    for (name, group) in groups {
        let build = BuildConfig::new(&config.root, name, group, &toolchain);
        log!("build"; "{}", build.name);
        if build.autoprefixer {
            log!("warning"; "[groups.{name}.autoprefixer] is not supported and has no effect");
        }
        AssetBuilder::new(&build, &LocalFs, &output, &compilers).build();
    }

    if output.warnings() > 0 {
        log!("warning"; "build finished with {} warning(s)", output.warnings());
    }
    match output.errors() {
        0 => Ok(()),
        n => bail!("build finished with {n} error(s)"),
    }
}
