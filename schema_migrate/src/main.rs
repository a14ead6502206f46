use anyhow::Context;
use clap::Parser;

use schema_migrate::cli::{self, Cli, CommandContext};
use schema_migrate::config::{load_from_file, load_models};
use schema_migrate::db::MigrationParam;
use schema_migrate::utils::logging::init_logging;
use schema_migrate::ModelRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_from_file(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config))?;
    config.debug |= cli.debug;

    init_logging(&config.logging).context("initializing logging")?;

    let models = match &config.models {
        Some(models) => ModelRegistry::from_definitions(
            load_models(&models.definitions)
                .with_context(|| format!("loading models from {}", models.definitions))?,
        ),
        None => ModelRegistry::new(),
    };

    let session = MigrationParam::from_config(&config).open();
    let mut ctx = CommandContext {
        config,
        models,
        session,
    };

    let outcome = cli::run(cli.command, &mut ctx).await;
    let closed = ctx.session.close().await;

    outcome?;
    closed.context("closing migration session")?;
    Ok(())
}
