use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use serde_json::json;
use std::fs;
use std::path::PathBuf;

mod cli;

use cli::{Cli, Commands, DaemonCommands, IdentityCommands};
use themr::config::ThemrConfig;
use themr::daemon;
use themr::domain::{Run, RunStatus, Theme};
use themr::ipc::{IpcClient, Methods};

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("themr")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("themr.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Connect to the daemon socket or explain how to start it
async fn connect(config: &ThemrConfig) -> Result<IpcClient> {
    IpcClient::connect_to(&config.ipc.socket_path).await.map_err(|e| {
        eyre::eyre!(
            "{}\nIs the daemon running? Start it with: themr daemon start",
            e
        )
    })
}

/// Format a millisecond timestamp for terminal output
fn format_timestamp(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

async fn run_application(cli: &Cli, config: ThemrConfig) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Daemon { command } => handle_daemon_command(command, config).await,
        Commands::Run { goal, iterations } => handle_run_command(goal, *iterations, &config).await,
        Commands::Runs => handle_runs_command(&config).await,
        Commands::Themes { limit, owner } => handle_themes_command(*limit, owner.as_deref(), &config).await,
        Commands::Upsert { name, styles, id, owner } => {
            handle_upsert_command(name, styles, id.as_deref(), owner.as_deref(), &config).await
        }
        Commands::Identity { command } => handle_identity_command(command, &config).await,
        Commands::Watch => handle_watch_command(&config).await,
    }
}

async fn handle_daemon_command(command: &DaemonCommands, config: ThemrConfig) -> Result<()> {
    match command {
        DaemonCommands::Start => {
            println!("{} {}", "Starting daemon on".cyan(), config.ipc.socket_path.display());
            daemon::run_daemon(config).await.map_err(|e| eyre::eyre!("Daemon failed: {}", e))
        }
        DaemonCommands::Status => {
            match connect(&config).await {
                Ok(client) => {
                    client
                        .request(Methods::PING, json!({}))
                        .await
                        .map_err(|e| eyre::eyre!("Daemon did not respond: {}", e))?;
                    println!("{}", "Daemon is running".green());
                }
                Err(_) => {
                    println!("{}", "Daemon is not running".red());
                }
            }
            Ok(())
        }
    }
}

async fn handle_run_command(goal: &str, iterations: Option<u32>, config: &ThemrConfig) -> Result<()> {
    let client = connect(config).await?;

    let mut params = json!({ "goal": goal });
    if let Some(iterations) = iterations {
        params["iterations"] = json!(iterations);
    }

    let result = client
        .request(Methods::RUN_START, params)
        .await
        .map_err(|e| eyre::eyre!("Failed to start run: {}", e))?;

    let run_id = result["run_id"].as_str().unwrap_or("<unknown>");
    println!("{} {}", "Run started:".green(), run_id);
    println!("Themes will appear in `themr themes` as the worker produces them.");
    Ok(())
}

async fn handle_runs_command(config: &ThemrConfig) -> Result<()> {
    let client = connect(config).await?;
    let result = client
        .request(Methods::RUN_LIST, json!({}))
        .await
        .map_err(|e| eyre::eyre!("Failed to list runs: {}", e))?;

    let runs: Vec<Run> = serde_json::from_value(result["runs"].clone()).unwrap_or_default();
    if runs.is_empty() {
        println!("No runs tracked.");
        return Ok(());
    }

    for run in runs {
        let label = format!("{:?}", run.status).to_lowercase();
        let status = match run.status {
            RunStatus::Succeeded => label.green(),
            RunStatus::Failed => label.red(),
            RunStatus::Running => label.cyan(),
            RunStatus::Queued => label.yellow(),
        };
        println!(
            "{}  {}  [{}] iterations={} goal={}",
            run.id,
            format_timestamp(run.created_at),
            status,
            run.iterations,
            run.goal
        );
    }
    Ok(())
}

async fn handle_themes_command(limit: Option<usize>, owner: Option<&str>, config: &ThemrConfig) -> Result<()> {
    let client = connect(config).await?;

    let mut params = json!({});
    if let Some(limit) = limit {
        params["limit"] = json!(limit);
    }
    if let Some(owner) = owner {
        params["owner"] = json!(owner);
    }

    let result = client
        .request(Methods::THEME_LIST, params)
        .await
        .map_err(|e| eyre::eyre!("Failed to list themes: {}", e))?;

    let themes: Vec<Theme> = serde_json::from_value(result["themes"].clone()).unwrap_or_default();
    if themes.is_empty() {
        println!("No themes in the registry.");
        return Ok(());
    }

    for theme in themes {
        println!(
            "{}  {}  {} ({} tokens, owner {})",
            theme.id,
            format_timestamp(theme.updated_at),
            theme.name.bold(),
            theme.styles.len(),
            theme.owner_id
        );
    }
    Ok(())
}

async fn handle_upsert_command(
    name: &str,
    styles: &str,
    id: Option<&str>,
    owner: Option<&str>,
    config: &ThemrConfig,
) -> Result<()> {
    let styles: serde_json::Value = serde_json::from_str(styles).context("styles must be valid JSON")?;

    let client = connect(config).await?;
    let mut params = json!({ "name": name, "styles": styles });
    if let Some(id) = id {
        params["id"] = json!(id);
    }
    if let Some(owner) = owner {
        params["owner"] = json!(owner);
    }

    let result = client
        .request(Methods::THEME_UPSERT, params)
        .await
        .map_err(|e| eyre::eyre!("Upsert failed: {}", e))?;

    let theme_id = result["theme_id"].as_str().unwrap_or("<unknown>");
    println!("{} {}", "Theme stored:".green(), theme_id);
    Ok(())
}

async fn handle_identity_command(command: &IdentityCommands, config: &ThemrConfig) -> Result<()> {
    let client = connect(config).await?;
    match command {
        IdentityCommands::Add { name, id } => {
            let mut params = json!({ "name": name });
            if let Some(id) = id {
                params["id"] = json!(id);
            }
            let result = client
                .request(Methods::IDENTITY_ADD, params)
                .await
                .map_err(|e| eyre::eyre!("Failed to add identity: {}", e))?;
            let identity_id = result["identity_id"].as_str().unwrap_or("<unknown>");
            println!("{} {}", "Identity added:".green(), identity_id);
        }
        IdentityCommands::List => {
            let result = client
                .request(Methods::IDENTITY_LIST, json!({}))
                .await
                .map_err(|e| eyre::eyre!("Failed to list identities: {}", e))?;
            let identities = result["identities"].as_array().cloned().unwrap_or_default();
            if identities.is_empty() {
                println!("No identities registered.");
            }
            for identity in identities {
                println!(
                    "{}  {}",
                    identity["id"].as_str().unwrap_or("<unknown>"),
                    identity["name"].as_str().unwrap_or("")
                );
            }
        }
    }
    Ok(())
}

async fn handle_watch_command(config: &ThemrConfig) -> Result<()> {
    let client = connect(config).await?;
    client
        .subscribe()
        .await
        .map_err(|e| eyre::eyre!("Failed to subscribe: {}", e))?;

    println!("{}", "Watching daemon events (ctrl-c to stop)...".cyan());
    while let Some(event) = client.next_event().await {
        println!("{}  {}", event.event.bold(), event.data);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = ThemrConfig::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, config).await.context("Application failed")?;

    Ok(())
}
