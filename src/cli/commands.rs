//! Command dispatch: settings resolution and one handler per subcommand

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::services::{ForestStats, OutputTarget};
use crate::application::OutputFormat;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{ForestConvert, Level};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::FileSystem;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        Cli::command()
            .print_help()
            .map_err(|e| InfraError::io("print help", e))?;
        return Ok(());
    };

    // Completions need no settings
    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let settings = resolve_settings(cli)?;
    let container = ServiceContainer::new(settings);

    match command {
        Commands::Generate {
            output,
            table,
            format,
        } => cmd_generate(&container, output.as_deref(), table.as_deref(), *format),
        Commands::Tree { max_depth } => cmd_tree(&container, *max_depth),
        Commands::Stats => cmd_stats(&container),
        Commands::Check => cmd_check(&container),
        Commands::Config { command } => cmd_config(&container, cli, command),
        Commands::Completion { .. } => Ok(()),
    }
}

fn project_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.project_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(std::env::current_dir().map_err(|e| InfraError::io("current dir", e))?),
    }
}

/// Layered settings with command line overrides applied last.
fn resolve_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_file(path)?,
        None => Settings::load(Some(&project_dir(cli)?))?,
    };
    if let Some(dir) = &cli.data_dir {
        settings = settings.with_data_dir(dir);
    }
    debug!("settings: {:?}", settings);
    Ok(settings)
}

#[instrument(skip(container))]
fn cmd_generate(
    container: &ServiceContainer,
    output_path: Option<&Path>,
    table: Option<&str>,
    format: Option<OutputFormat>,
) -> CliResult<()> {
    let settings = &container.settings;
    let target = OutputTarget::from_path(output_path.unwrap_or(settings.output.as_path()));
    let table = table.unwrap_or(settings.table.as_str());
    let format = format.unwrap_or(settings.format);

    let stats = container
        .division
        .generate(&settings.dataset_paths(), &target, format, table)?;

    let message = format!(
        "{} rows written, keys {} to {}",
        stats.nodes, stats.first_key, stats.last_key
    );
    match target {
        OutputTarget::Stdout => output::success_stderr(&message),
        OutputTarget::File(path) => output::success(&format!("{} ({})", message, path.display())),
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer, max_depth: Option<usize>) -> CliResult<()> {
    if max_depth == Some(0) {
        return Err(CliError::InvalidArgs("--max-depth must be at least 1".into()));
    }
    let dataset = container
        .division
        .load(&container.settings.dataset_paths())?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for tree in dataset.forest.to_tree_strings(max_depth) {
        write!(out, "{}", tree).map_err(|e| InfraError::io("write tree", e))?;
    }
    Ok(())
}

fn print_stats(stats: &ForestStats) {
    output::header("Records");
    for level in Level::ALL {
        let count = stats.records.get(&level).copied().unwrap_or(0);
        output::detail(&format!("{:<10} {}", level.plural(), count));
    }
    output::header("Forest");
    output::detail(&format!("{:<10} {}", "roots", stats.roots));
    output::detail(&format!("{:<10} {}", "nodes", stats.nodes));
    output::detail(&format!("{:<10} {}", "leaves", stats.leaves));
    output::detail(&format!("{:<10} {}", "depth", stats.max_depth));
    output::detail(&format!(
        "{:<10} {} to {}",
        "keys", stats.first_key, stats.last_key
    ));
}

#[instrument(skip(container))]
fn cmd_stats(container: &ServiceContainer) -> CliResult<()> {
    let dataset = container
        .division
        .load(&container.settings.dataset_paths())?;
    print_stats(&ForestStats::of(&dataset));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_check(container: &ServiceContainer) -> CliResult<()> {
    let stats = container
        .division
        .check(&container.settings.dataset_paths())?;
    output::success(&format!(
        "nested set valid: {} nodes in {} trees, keys {} to {}",
        stats.nodes, stats.roots, stats.first_key, stats.last_key
    ));
    Ok(())
}

fn cmd_config(container: &ServiceContainer, cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let fs = container.fs.as_ref();
            match global_config_path() {
                Some(path) => output::action("global", &describe(fs, &path)),
                None => output::action("global", &"<no config directory>"),
            }
            match &cli.config {
                Some(path) => output::action("explicit", &describe(fs, path)),
                None => output::action(
                    "project",
                    &describe(fs, &local_config_path(&project_dir(cli)?)),
                ),
            }
        }
    }
    Ok(())
}

fn describe(fs: &dyn FileSystem, path: &Path) -> String {
    if fs.exists(path) {
        path.display().to_string()
    } else {
        format!("{} (not found)", path.display())
    }
}
