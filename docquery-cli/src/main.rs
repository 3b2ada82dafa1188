//! `docquery` - ask an OpenAI assistant about a document it keeps in a
//! vector store.
//!
//! The first run creates the assistant and the store and uploads the
//! configured documents; later runs reuse them by name.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use docquery::CancellationToken;
use docquery::poll::Poller;
use docquery_cli::config::{
    DocqueryConfig, IssueLevel, config_path, init_config_at, load_config_from,
};
use docquery_cli::orchestrator::{self, Provisioned};
use docquery_cli::{CliError, CliResult};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Query a document through an OpenAI assistant
#[derive(Debug, Parser)]
#[command(name = "docquery")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "DOCQUERY_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Provision if needed, then ask (the default)
    Run(QueryArgs),

    /// Find or create the assistant and knowledge store, print their ids
    Provision(ModelArgs),

    /// Ask using existing resources only
    Query(QueryArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments shared by the commands that may create an assistant
#[derive(Debug, Default, Args)]
struct ModelArgs {
    /// Model for a newly created assistant (overrides config)
    #[arg(short, long)]
    model: Option<String>,
}

/// Arguments for the commands that ask a question
#[derive(Debug, Default, Args)]
struct QueryArgs {
    /// Code substituted into the query template (overrides config)
    #[arg(long, conflicts_with = "text")]
    code: Option<String>,

    /// Raw question text, bypassing the template
    #[arg(short, long)]
    text: Option<String>,

    #[command(flatten)]
    model: ModelArgs,
}

/// Arguments for the config command
#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Show configuration file path
    Path,
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Validate configuration
    Validate,
}

/// Commands suggested after `config init`.
const NEXT_STEP_COMMANDS: [&str; 2] = ["docquery provision", "docquery run --code 1017"];

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "failed to create tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    let result = rt.block_on(async {
        tokio::select! {
            result = run(cli, cancel.clone()) => result,
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                Err(CliError::Cancelled)
            }
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if matches!(e, CliError::Cancelled) {
                tracing::warn!("interrupted");
            } else {
                tracing::error!("{e}");
            }
            ExitCode::from(e.exit_code())
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "docquery={level},docquery_cli={level},{}",
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli, cancel: CancellationToken) -> CliResult<()> {
    let path = config_path(cli.config);
    match cli.command.unwrap_or_else(|| Commands::Run(QueryArgs::default())) {
        Commands::Run(args) => cmd_ask(&path, args, cancel, true).await,
        Commands::Query(args) => cmd_ask(&path, args, cancel, false).await,
        Commands::Provision(args) => cmd_provision(&path, &args, cancel).await,
        Commands::Config(args) => cmd_config(args, &path).await,
    }
}

async fn load(path: &Path, model: &ModelArgs) -> CliResult<DocqueryConfig> {
    let mut config = load_config_from(path).await?;
    if let Some(model) = &model.model {
        config.assistant.model.clone_from(model);
    }

    for issue in config.validate() {
        match issue.level {
            IssueLevel::Error => tracing::error!("{issue}"),
            IssueLevel::Warning => tracing::warn!("{issue}"),
        }
    }
    if !config.is_valid() {
        return Err(CliError::config(format!(
            "{} is invalid, see `docquery config validate`",
            path.display()
        )));
    }
    Ok(config)
}

fn poller(config: &DocqueryConfig, cancel: CancellationToken) -> Poller {
    Poller::new(config.poll_policy()).with_cancellation(cancel)
}

/// Ask the configured question, provisioning first when `create` is set.
async fn cmd_ask(
    path: &Path,
    args: QueryArgs,
    cancel: CancellationToken,
    create: bool,
) -> CliResult<()> {
    let config = load(path, &args.model).await?;
    let client = orchestrator::connect(&config)?;
    let poller = poller(&config, cancel);

    let ready = if create {
        orchestrator::provision(&client, &config, &poller).await?
    } else {
        orchestrator::lookup(&client, &config).await?
    };

    let text = args.text.unwrap_or_else(|| {
        let code = args.code.as_deref().unwrap_or(&config.query.code);
        config.render_query(code)
    });
    tracing::debug!(question = %text, "asking");

    if let Some(answer) = orchestrator::ask(&client, &ready, text, &poller).await? {
        println!("{answer}");
    }
    Ok(())
}

/// Provision and print the resource ids.
async fn cmd_provision(
    path: &Path,
    args: &ModelArgs,
    cancel: CancellationToken,
) -> CliResult<()> {
    let config = load(path, args).await?;
    let client = orchestrator::connect(&config)?;

    let Provisioned {
        assistant,
        store,
        document_id,
    } = orchestrator::provision(&client, &config, &poller(&config, cancel)).await?;

    println!("assistant:    {}", assistant.id);
    println!("vector store: {}", store.id);
    println!("document:     {}", document_id.as_deref().unwrap_or("(none)"));
    Ok(())
}

/// Manage configuration.
async fn cmd_config(args: ConfigArgs, path: &Path) -> CliResult<()> {
    match args.command {
        ConfigCommands::Path => {
            println!("{}", path.display());
        }
        ConfigCommands::Show => {
            let config = load_config_from(path).await?;
            let content = toml::to_string_pretty(&config)
                .map_err(|e| CliError::config(format!("failed to render config: {e}")))?;
            println!("{content}");
        }
        ConfigCommands::Init { force } => {
            init_config_at(path, force).await?;
            println!("Configuration created: {}", path.display());
            println!();
            println!("Next steps:");
            println!("  1. put the API key, organization and project ids in the [credentials] files");
            for (step, command) in NEXT_STEP_COMMANDS.iter().enumerate() {
                println!("  {}. {command}", step + 2);
            }
        }
        ConfigCommands::Validate => {
            let config = load_config_from(path).await?;
            let issues = config.validate();
            for issue in &issues {
                println!("{issue}");
            }
            if !config.is_valid() {
                return Err(CliError::config("configuration has errors"));
            }
            if issues.is_empty() {
                println!("Configuration is valid");
            }
        }
    }

    Ok(())
}
