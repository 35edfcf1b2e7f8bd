use anyhow::Result;
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use vaultlift_cli::{
    cli::{Cli, Commands},
    commands, output,
};
use vaultlift_config::MigrationConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging: --log-level / --verbose, else RUST_LOG, else warn
    let env_filter = match cli.requested_level() {
        Some(level) => EnvFilter::default().add_directive(level.into()),
        None => EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .from_env_lossy(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => {
            let config = MigrationConfig::load(&args.overrides(cli.config))?;
            let summary = commands::run::execute(config, args).await?;
            if summary.has_failures() {
                for (path, err) in &summary.failed_documents {
                    output::error(&format!("{}: {}", path.display(), err));
                }
                std::process::exit(1);
            }
        }
        Commands::Config(cmd) => commands::config::execute(cmd, cli.config)?,
    }

    Ok(())
}
