//! Command-line interface
//!
//! `schema_migrate` without a sub-command prints the database version.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::Path;

use crate::config::Config;
use crate::db::lifecycle::MigrationSession;
use crate::error::{settle, Error, Result};
use crate::models::ModelRegistry;
use crate::ops::check::{get_migrate_ops, DiffSynchronizer, SchemaSynchronizer};
use crate::preview::{preview_next_migration, PreviewOutcome};
use crate::scripts::naming::{ScriptNaming, VersionType};
use crate::scripts::next::{next_script_info, ScriptAction};
use crate::scripts::options::ScriptOptions;
use crate::status::{get_status, show_status};

#[derive(Parser, Debug)]
#[command(name = "schema_migrate")]
#[command(about = "Diff models against the database and manage versioned migration scripts")]
#[command(version)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "schema_migrate.toml")]
    pub config: String,

    /// Mirror captured statements to the debug log
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run all pending migration scripts
    All,

    /// Run the next migration script (+1)
    Inc,

    /// Roll back the latest migration script (-1)
    Dec,

    /// Show the next migration script and the changes it would hold
    #[command(name = "new-script", alias = "next-script")]
    NewScript {
        #[command(subcommand)]
        action: Option<NewScriptAction>,
    },

    /// Test migration SQL without applying changes
    Preview {
        #[command(subcommand)]
        action: PreviewAction,
    },

    /// Show database version, scripts, pending migrations and schema differences
    Status,
}

#[derive(Subcommand, Debug)]
pub enum NewScriptAction {
    /// Create a new migration script pair
    Create {
        /// Version pattern: NEXT, UNIX or TIME
        #[arg(short = 't', long, default_value = "NEXT")]
        version_type: VersionType,

        /// Description used in the file name, `[scripts] description` when omitted
        #[arg(short, long)]
        description: Option<String>,

        /// Write the pair even when there are no schema changes
        #[arg(short = 'e', long)]
        allow_empty_script: bool,
    },

    /// Rewrite the latest script pair that was not applied yet
    Update,
}

#[derive(Subcommand, Debug)]
pub enum PreviewAction {
    /// Preview the next migration step (+1)
    Inc,
}

/// Everything a command runs against
pub struct CommandContext {
    pub config: Config,
    pub models: ModelRegistry,
    pub session: MigrationSession,
}

/// Run one command
pub async fn run(command: Option<Commands>, ctx: &mut CommandContext) -> Result<()> {
    match command {
        None => show_version(ctx).await,
        Some(Commands::All) => settle(ctx.session.engine().await?.up().await),
        Some(Commands::Inc) => settle(ctx.session.engine().await?.steps(1).await),
        Some(Commands::Dec) => settle(ctx.session.engine().await?.steps(-1).await),
        Some(Commands::NewScript { action: None }) => show_next_script(ctx).await,
        Some(Commands::NewScript {
            action:
                Some(NewScriptAction::Create {
                    version_type,
                    description,
                    allow_empty_script,
                }),
        }) => {
            let naming = create_naming(&ctx.config, version_type, description);
            write_next_script(ctx, ScriptAction::CreateScript, naming, allow_empty_script).await
        }
        Some(Commands::NewScript {
            action: Some(NewScriptAction::Update),
        }) => write_next_script(ctx, ScriptAction::UpdateScript, ScriptNaming::default(), false).await,
        Some(Commands::Preview {
            action: PreviewAction::Inc,
        }) => preview_inc(ctx).await,
        Some(Commands::Status) => status(ctx).await,
    }
}

async fn show_version(ctx: &mut CommandContext) -> Result<()> {
    match ctx.session.engine().await?.version().await {
        Ok((version, true)) => println!("{}", format!("{} (DIRTY)", version).red()),
        Ok((version, false)) => println!("{}", version.to_string().green()),
        Err(e) => settle(Err(e))?,
    }
    Ok(())
}

fn script_options(config: &Config) -> ScriptOptions {
    ScriptOptions::from_config(&config.scripts)
}

fn default_naming(config: &Config) -> ScriptNaming {
    ScriptNaming::new(VersionType::Next, config.scripts.description.clone())
}

fn create_naming(config: &Config, version_type: VersionType, description: Option<String>) -> ScriptNaming {
    let description = description.unwrap_or_else(|| config.scripts.description.clone());
    ScriptNaming::new(version_type, description)
}

async fn show_next_script(ctx: &mut CommandContext) -> Result<()> {
    show_version(ctx).await?;

    let options = script_options(&ctx.config);
    let naming = default_naming(&ctx.config);
    let (engine, connection) = ctx.session.acquire().await?;

    let info = next_script_info(engine, &options, &naming).await?;
    tracing::info!("new-script-info: {}", serde_json::to_string_pretty(&info)?);

    let synchronizer = DiffSynchronizer::new(connection.clone(), ctx.config.clone());
    let ops = get_migrate_ops(&synchronizer, &ctx.models, ctx.config.debug).await?;
    if !ops.is_empty() {
        tracing::debug!("{}", ops.forward_script().green());
        let (reverse_script, _) = ops.reverse_script();
        tracing::debug!("{}", reverse_script.yellow());
    }

    println!("{}", "SUCCESS".green());
    Ok(())
}

async fn write_next_script(
    ctx: &mut CommandContext,
    expected: ScriptAction,
    naming: ScriptNaming,
    allow_empty_script: bool,
) -> Result<()> {
    let options = script_options(&ctx.config);
    let (engine, connection) = ctx.session.acquire().await?;
    tracing::info!("script-naming: {}", serde_json::to_string(&naming)?);

    let info = next_script_info(engine, &options, &naming).await?;
    tracing::info!(forward = %info.forward_name, reverse = %info.reverse_name, "script-names");

    if info.action != expected {
        let hint = match info.action {
            ScriptAction::UpdateScript => "use `new-script update` while there are unapplied scripts",
            ScriptAction::CreateScript => "use `new-script create` when there are no unapplied scripts",
        };
        println!("{}", format!("FAILED. {}", hint).red());
        return Err(Error::fatal(format!(
            "next script is {} but {:?} was requested: {}",
            info.forward_name, expected, hint
        )));
    }

    let synchronizer = DiffSynchronizer::new(connection.clone(), ctx.config.clone());
    let ops = get_migrate_ops(&synchronizer, &ctx.models, ctx.config.debug).await?;

    if !ops.is_empty() || allow_empty_script || info.script_exists(&options) {
        info.write_scripts(&ops, &options)?;
    } else {
        tracing::info!("No schema changes, no script written");
    }

    println!("{}", "SUCCESS".green());
    Ok(())
}

async fn preview_inc(ctx: &mut CommandContext) -> Result<()> {
    let scripts_root = ctx.config.scripts.directory.clone();
    let (engine, connection) = ctx.session.acquire().await?;

    match preview_next_migration(engine, connection, Path::new(&scripts_root)).await {
        Ok(PreviewOutcome::Empty { script }) => {
            println!("{}", format!("EMPTY MIGRATION FILE - PREVIEW SUCCESS ({})", script).blue());
            Ok(())
        }
        Ok(PreviewOutcome::Success { script }) => {
            println!("{}", format!("PREVIEW SUCCESS ({})", script).green());
            Ok(())
        }
        Err(e) => {
            println!("{}", "PREVIEW FAILED:".red());
            Err(e)
        }
    }
}

async fn status(ctx: &mut CommandContext) -> Result<()> {
    let scripts_root = ctx.config.scripts.directory.clone();
    let (engine, connection) = ctx.session.acquire().await?;

    let synchronizer = DiffSynchronizer::new(connection.clone(), ctx.config.clone());
    let schema_check: (&dyn SchemaSynchronizer, &ModelRegistry) = (&synchronizer, &ctx.models);
    let status = get_status(
        engine,
        Path::new(&scripts_root),
        Some(schema_check),
        ctx.config.debug,
    )
    .await?;

    show_status(&status);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_create() {
        let cli = Cli::parse_from([
            "schema_migrate",
            "new-script",
            "create",
            "--version-type",
            "time",
            "--description",
            "add rank",
            "-e",
        ]);

        match cli.command {
            Some(Commands::NewScript {
                action:
                    Some(NewScriptAction::Create {
                        version_type,
                        description,
                        allow_empty_script,
                    }),
            }) => {
                assert_eq!(version_type, VersionType::Time);
                assert_eq!(description.as_deref(), Some("add rank"));
                assert!(allow_empty_script);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_create_description_falls_back_to_config() {
        let cli = Cli::parse_from(["schema_migrate", "new-script", "create"]);
        let description = match cli.command {
            Some(Commands::NewScript {
                action: Some(NewScriptAction::Create { description, .. }),
            }) => description,
            other => panic!("unexpected command: {:?}", other),
        };
        assert_eq!(description, None);

        let config: Config = toml::from_str(
            r#"
            [database]
            driver = "sqlite"
            url = "sqlite://app.db"

            [scripts]
            directory = "./scripts"
            description = "from config"
            "#,
        )
        .unwrap();

        let naming = create_naming(&config, VersionType::Next, description);
        assert_eq!(naming.description, "from config");

        let naming = create_naming(&config, VersionType::Next, Some("add rank".to_string()));
        assert_eq!(naming.description, "add rank");
    }

    #[test]
    fn test_next_script_alias() {
        let cli = Cli::parse_from(["schema_migrate", "next-script", "update"]);
        assert!(matches!(
            cli.command,
            Some(Commands::NewScript {
                action: Some(NewScriptAction::Update)
            })
        ));
    }

    #[test]
    fn test_root_without_command() {
        let cli = Cli::parse_from(["schema_migrate", "--config", "other.toml"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, "other.toml");
    }
}
