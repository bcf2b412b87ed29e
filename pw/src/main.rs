//! Planwise - planning request dispatcher
//!
//! CLI entry point for one-shot planning and the HTTP API server.

use std::fs;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info};

use planwise::api;
use planwise::cli::{Cli, Command, get_log_path};
use planwise::config::Config;
use planwise::dispatch::Dispatcher;
use planwise::planner::{MessageType, PlanRequest};

/// Where log lines go: the serve command logs to a file like a daemon,
/// one-shot planning logs to stderr so stdout stays clean markdown.
enum LogTarget {
    Stderr,
    File,
}

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>, target: LogTarget) -> Result<()> {
    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level_str = cli_log_level.or(config_log_level);
    let level = if let Some(s) = level_str {
        match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        }
    } else {
        tracing::Level::INFO
    };

    match target {
        LogTarget::File => {
            let log_path = get_log_path();
            if let Some(log_dir) = log_path.parent() {
                fs::create_dir_all(log_dir).context("Failed to create log directory")?;
            }
            let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

            tracing_subscriber::fmt()
                .with_writer(log_file)
                .with_ansi(false)
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
                .init();
        }
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
                .init();
        }
    }

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    let target = match cli.command {
        Command::Serve { .. } => LogTarget::File,
        Command::Plan { .. } => LogTarget::Stderr,
    };
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref(), target).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate()?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Plan {
            query,
            session_id,
            message_type,
            fast,
        } => cmd_plan(&config, query, session_id, &message_type, fast).await,
        Command::Serve { bind } => cmd_serve(&config, bind).await,
    }
}

/// Plan once and print the itinerary markdown to stdout
async fn cmd_plan(
    config: &Config,
    query: String,
    session_id: Option<String>,
    message_type: &str,
    fast: bool,
) -> Result<()> {
    debug!(query_len = query.len(), ?session_id, %message_type, fast, "cmd_plan: called");

    let dispatcher = Dispatcher::from_config(config).context("Failed to build dispatcher")?;

    let mut req = PlanRequest::new(query).with_message_type(MessageType::from_str_lossy(message_type));
    if let Some(session_id) = session_id {
        req = req.with_session_id(session_id);
    }
    if fast {
        req = req.with_fast_mode(true);
    }

    match dispatcher.dispatch(req).await {
        Ok(result) => {
            debug!(source_tier = %result.source_tier, degraded = result.degraded, "cmd_plan: dispatched");
            if result.degraded {
                eprintln!("note: degraded answer (source: {})", result.source_tier);
            }
            println!("{}", result.markdown);
            Ok(())
        }
        Err(e) => {
            debug!(error = %e, "cmd_plan: request rejected");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Serve the HTTP planning API
async fn cmd_serve(config: &Config, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    debug!(%bind, "cmd_serve: called");

    let dispatcher = Dispatcher::from_config(config).context("Failed to build dispatcher")?;

    info!("Planwise API starting on {}", bind);
    api::run(api::AppState::new(dispatcher), &bind).await
}
