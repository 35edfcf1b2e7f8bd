use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use vaultlift_config::{ConfigOverrides, StorageBackend};

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Storage backend choice on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Http,
    Directory,
}

impl From<BackendArg> for StorageBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Http => StorageBackend::Http,
            BackendArg::Directory => StorageBackend::Directory,
        }
    }
}

/// Output format for `config show`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ConfigFormat {
    #[default]
    Toml,
    Json,
}

#[derive(Parser)]
#[command(name = "vaultlift")]
#[command(about = "vaultlift - move images embedded in markdown notes to remote storage")]
#[command(version)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses RUST_LOG or defaults to 'warn'
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to ~/.config/vaultlift/config.toml)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Level requested on the command line, if any
    pub fn requested_level(&self) -> Option<LevelFilter> {
        self.log_level
            .map(LevelFilter::from)
            .or(self.verbose.then_some(LevelFilter::DEBUG))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload the images a note (or every note under a folder) embeds and
    /// rewrite the note to point at the uploaded copies
    Run(RunArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Markdown file or folder of markdown files
    pub path: PathBuf,

    /// Replace the original files instead of writing to the output folder
    #[arg(long)]
    pub overwrite: bool,

    /// Show what would be uploaded without uploading or writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Folder holding the local images (overrides config)
    #[arg(short = 'i', long)]
    pub image_root: Option<PathBuf>,

    /// Folder for rewritten notes (overrides config)
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Uploads in flight per note
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Seconds to wait for one note's uploads
    #[arg(short = 't', long)]
    pub timeout: Option<u64>,

    /// Notes processed at the same time
    #[arg(long)]
    pub workers: Option<usize>,

    /// Storage backend
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Upload endpoint for the http backend
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Base URL written into notes (defaults to the endpoint)
    #[arg(long)]
    pub public_base_url: Option<String>,

    /// Target folder for the directory backend
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl RunArgs {
    /// Command line values as config overrides
    pub fn overrides(&self, config_file: Option<PathBuf>) -> ConfigOverrides {
        ConfigOverrides {
            config_file,
            image_root: self.image_root.clone(),
            output_dir: self.output_dir.clone(),
            overwrite: self.overwrite.then_some(true),
            concurrency_limit: self.concurrency,
            timeout_seconds: self.timeout,
            document_workers: self.workers,
            backend: self.backend.map(StorageBackend::from),
            endpoint: self.endpoint.clone(),
            public_base_url: self.public_base_url.clone(),
            storage_directory: self.storage_dir.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize a new config file
    Init {
        /// Path for the config file (defaults to ~/.config/vaultlift/config.toml)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite existing config file
        #[arg(short = 'F', long)]
        force: bool,
    },

    /// Show the current effective configuration
    Show {
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
    },

    /// Print the default config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_args_become_overrides() {
        let cli = Cli::try_parse_from([
            "vaultlift",
            "run",
            "notes",
            "--overwrite",
            "-j",
            "3",
            "--backend",
            "directory",
            "--storage-dir",
            "/srv/img",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        let overrides = args.overrides(None);

        assert_eq!(overrides.overwrite, Some(true));
        assert_eq!(overrides.concurrency_limit, Some(3));
        assert_eq!(overrides.backend, Some(StorageBackend::Directory));
        assert_eq!(overrides.storage_directory, Some(PathBuf::from("/srv/img")));
        assert_eq!(overrides.output_dir, None);
    }

    #[test]
    fn test_without_overwrite_flag_config_decides() {
        let cli = Cli::try_parse_from(["vaultlift", "run", "notes"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };

        assert_eq!(args.overrides(None).overwrite, None);
    }

    #[test]
    fn test_verbose_means_debug() {
        let cli = Cli::try_parse_from(["vaultlift", "-v", "config", "path"]).unwrap();
        assert_eq!(cli.requested_level(), Some(LevelFilter::DEBUG));

        let cli = Cli::try_parse_from(["vaultlift", "-l", "trace", "-v", "config", "path"]).unwrap();
        assert_eq!(cli.requested_level(), Some(LevelFilter::TRACE));

        let cli = Cli::try_parse_from(["vaultlift", "config", "path"]).unwrap();
        assert_eq!(cli.requested_level(), None);
    }
}
