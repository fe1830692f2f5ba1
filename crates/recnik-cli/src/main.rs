//! Recnik CLI
//!
//! Command-line interface for recnik - Serbian/English dictionary lookup.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use recnik_core::{Bootstrapper, Config, Script};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "recnik")]
#[command(about = "Recnik - Serbian (Cyrillic/Latin) and English dictionary")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log debug information to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List entries sorted by headword
    #[command(alias = "ls")]
    List {
        /// Script to sort and filter by (cyrillic, latin, english)
        #[arg(short, long, default_value = "latin")]
        script: Script,
        /// Only entries whose headword starts with this letter or prefix
        #[arg(short, long)]
        letter: Option<String>,
    },
    /// Show an entry
    Show {
        /// Entry ID
        id: i64,
    },
    /// Show the entry a recnik://word/<id> link points to
    Open {
        /// Entry link
        link: String,
    },
    /// Search headwords in all scripts
    Search {
        /// Search query
        query: String,
        /// Script to sort results by
        #[arg(short, long, default_value = "latin")]
        script: Script,
    },
    /// Show the entry of the day
    Today,
    /// Check for dictionary updates now
    Sync,
    /// Show store and sync status
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Build a bundled dictionary snapshot from a JSON list of entries
    Snapshot {
        /// JSON file with a list of add changes
        input: PathBuf,
        /// Snapshot file to create
        output: PathBuf,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, bundle_path, sync_url, sync_enabled, sync_timeout_secs)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    init_logging(cli.verbose, cli.quiet);

    // Commands that don't need the store
    match cli.command {
        Commands::Config { command } => {
            return handle_config_command(command, cli.config.as_ref(), &output);
        }
        Commands::Snapshot {
            input,
            output: target,
        } => {
            return commands::snapshot::build(input, target, &output);
        }
        _ => {}
    }

    let config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    let repo = Bootstrapper::from_config(&config).repository();

    if let Commands::Sync = cli.command {
        return commands::sync::sync(&config, &repo, &output).await;
    }

    // Read commands answer from local data; an update check runs alongside
    let background = commands::sync::spawn_background(&config, repo.clone());

    let result = match cli.command {
        Commands::List { script, letter } => commands::entry::list(&repo, script, letter, &output),
        Commands::Show { id } => commands::entry::show(&repo, id, &output),
        Commands::Open { link } => commands::entry::open(&repo, link, &output),
        Commands::Search { query, script } => {
            commands::entry::search(&repo, query, script, &output)
        }
        Commands::Today => commands::entry::today(&repo, &output),
        Commands::Status => commands::status::show(&config, &repo, &output),
        Commands::Sync | Commands::Config { .. } | Commands::Snapshot { .. } => Ok(()),
    };

    if let Some(handle) = background {
        commands::sync::finish_background(handle, &config, &output).await;
    }

    result
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Initialize logging to stderr
///
/// RECNIK_LOG sets the level for recnik's own crates; otherwise --verbose
/// selects debug and the default shows warnings only.
fn init_logging(verbose: bool, quiet: bool) {
    let level = match std::env::var("RECNIK_LOG") {
        Ok(level) if !level.is_empty() => level,
        _ if verbose => "debug".to_string(),
        _ if quiet => "error".to_string(),
        _ => "warn".to_string(),
    };

    let env_filter = EnvFilter::try_new(format!("recnik_core={},recnik_cli={}", level, level))
        .unwrap_or_else(|_| EnvFilter::new("recnik_core=warn,recnik_cli=warn"));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
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
    fn test_parse_list_with_script_and_letter() {
        let cli = Cli::try_parse_from(["recnik", "list", "--script", "cyr", "--letter", "к"]).unwrap();
        match cli.command {
            Commands::List { script, letter } => {
                assert_eq!(script, Script::Cyrillic);
                assert_eq!(letter.as_deref(), Some("к"));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["recnik", "today", "--json", "-v"]).unwrap();
        assert!(cli.json);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Today));
    }

    #[test]
    fn test_rejects_unknown_script() {
        assert!(Cli::try_parse_from(["recnik", "list", "--script", "greek"]).is_err());
    }
}
