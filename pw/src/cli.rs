//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Planwise - planning request dispatcher
#[derive(Parser)]
#[command(
    name = "planwise",
    about = "Deadline-bounded dispatcher for conversational trip planning",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan a trip once and print the itinerary markdown
    Plan {
        /// Travel query, e.g. "Delhi to Jaipur, 2 days, budget"
        query: String,

        /// Session identifier from the chat layer
        #[arg(long = "session-id")]
        session_id: Option<String>,

        /// Message type: text or refinement
        #[arg(long = "message-type", default_value = "text")]
        message_type: String,

        /// Trim planner work for a faster, rougher answer
        #[arg(long)]
        fast: bool,
    },

    /// Serve the HTTP planning API
    Serve {
        /// Bind address (defaults to the configured server.bind)
        #[arg(short, long)]
        bind: Option<String>,
    },
}

/// Log file location for `pw serve`
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("planwise")
        .join("logs")
        .join("planwise.log")
}
