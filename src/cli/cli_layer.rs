// CLI layer - argument parsing and command dispatch.
//
// Stands in for the two outside callers of the moderation core: the
// message send pipeline (`check`, `send`, `scan`) and the admin review
// surface (`alerts`, `show`, `review`).

#[path = "commands.rs"]
pub mod commands;

#[path = "formatter.rs"]
pub mod formatter;

use crate::core::moderation::AlertStatus;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "coach-message-safety")]
#[command(about = "Screen coach/athlete messages and triage moderation alerts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Classify text without storing anything (reads stdin when no text is given)
    Check { text: Vec<String> },

    /// Screen one message through the send path, creating an alert if flagged
    Send {
        #[arg(long)]
        message_id: String,
        #[arg(long)]
        sender: String,
        #[arg(long)]
        recipient: String,
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Screen JSON-lines messages from stdin
    Scan,

    /// List moderation alerts, newest first
    Alerts {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Show one moderation alert
    Show { id: i64 },

    /// Mark an open alert as reviewed (or dismissed)
    Review {
        id: i64,
        #[arg(long)]
        reviewer: String,
        /// Dismiss the alert as a false positive
        #[arg(long)]
        dismiss: bool,
        #[arg(long)]
        note: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Open,
    Reviewed,
    Dismissed,
}

impl From<StatusArg> for AlertStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Open => AlertStatus::Open,
            StatusArg::Reviewed => AlertStatus::Reviewed,
            StatusArg::Dismissed => AlertStatus::Dismissed,
        }
    }
}
