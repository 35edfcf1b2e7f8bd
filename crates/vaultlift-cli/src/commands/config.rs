use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::cli::{ConfigCommands, ConfigFormat};
use vaultlift_config::{ConfigOverrides, MigrationConfig};

/// Execute config subcommand
pub fn execute(cmd: ConfigCommands, config_file: Option<PathBuf>) -> Result<()> {
    match cmd {
        ConfigCommands::Init { path, force } => init(path.or(config_file), force),
        ConfigCommands::Show { format } => show(config_file, format),
        ConfigCommands::Path => path(config_file),
    }
}

/// Initialize a new config file
fn init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = match path {
        Some(path) => path,
        None => MigrationConfig::default_config_path()?,
    };

    if config_path.exists() && !force {
        println!(
            "{} Config file already exists at: {}",
            "Error:".red().bold(),
            config_path.display()
        );
        println!("Use {} to overwrite", "--force".yellow());
        return Ok(());
    }

    MigrationConfig::create_example(&config_path)?;

    println!(
        "{} Created config file at: {}",
        "Success:".green().bold(),
        config_path.display()
    );
    println!(
        "\n{}",
        "Set storage.endpoint (or storage.directory) before running a migration.".dimmed()
    );

    Ok(())
}

/// Show the current effective configuration
///
/// Validation problems are reported but do not hide the config.
fn show(config_file: Option<PathBuf>, format: ConfigFormat) -> Result<()> {
    let config = MigrationConfig::resolve(&ConfigOverrides {
        config_file,
        ..Default::default()
    })
    .context("Failed to load configuration")?;

    if let Err(e) = config.validate() {
        eprintln!("{} {}", "Warning:".yellow().bold(), e);
    }

    let rendered = match format {
        ConfigFormat::Json => config.display_as_json()?,
        ConfigFormat::Toml => config.display_as_toml()?,
    };
    println!("{}", rendered);

    Ok(())
}

/// Print the config file path
fn path(config_file: Option<PathBuf>) -> Result<()> {
    let path = match config_file {
        Some(path) => path,
        None => MigrationConfig::default_config_path()?,
    };
    println!("{}", path.display());
    Ok(())
}
