// This is the entry point of the message safety tool.
//
// **Architecture Overview:**
// - `core/` = Business logic (content filter, alert workflow)
// - `infra/` = Implementations of core traits (SQLite, in-memory)
// - `cli/` = Command-line adapter (argument parsing, output formatting)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Dispatch the requested command

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with a pile of mod.rs files that all look the same.
#[path = "cli/cli_layer.rs"]
mod cli;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::cli::{commands, Cli, Commands};
use crate::core::moderation::{AlertStore, ModerationService, SafetyConfig};
use crate::infra::moderation::{InMemoryAlertStore, SqliteAlertStore};
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "data/moderation.db";

/// Where moderation alerts are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreBackend {
    Sqlite,
    Memory,
}

#[derive(Debug)]
struct AppConfig {
    store: StoreBackend,
    db_path: PathBuf,
    safety: SafetyConfig,
}

/// Read configuration from environment variables (after `.env` is loaded).
fn load_config() -> Result<AppConfig> {
    let store = match std::env::var("SAFETY_STORE") {
        Ok(value) => match value.trim().to_lowercase().as_str() {
            "" | "sqlite" => StoreBackend::Sqlite,
            "memory" => StoreBackend::Memory,
            other => bail!("Unknown SAFETY_STORE {:?} (expected \"sqlite\" or \"memory\")", other),
        },
        Err(_) => StoreBackend::Sqlite,
    };

    let db_path = std::env::var("SAFETY_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));

    let alerts_enabled = match std::env::var("SAFETY_ALERTS_ENABLED") {
        Ok(value) => value.trim().parse::<bool>().unwrap_or_else(|_| {
            tracing::warn!(
                "Ignoring invalid SAFETY_ALERTS_ENABLED value {:?}, alerts stay enabled",
                value
            );
            true
        }),
        Err(_) => SafetyConfig::default().alerts_enabled,
    };

    Ok(AppConfig {
        store,
        db_path,
        safety: SafetyConfig { alerts_enabled },
    })
}

async fn run_with_service<S: AlertStore>(
    command: Commands,
    service: &ModerationService<S>,
) -> Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::run(command, service, stdin.lock(), &mut out).await
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout only carries command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // `check` never touches storage
    if let Commands::Check { text } = &cli.command {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        return commands::check(text, stdin.lock(), &mut stdout.lock());
    }

    let config = load_config()?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    match config.store {
        StoreBackend::Memory => {
            tracing::debug!("Using in-memory alert store");
            let service = ModerationService::new(InMemoryAlertStore::new(), config.safety);
            run_with_service(cli.command, &service).await
        }
        StoreBackend::Sqlite => {
            let store = SqliteAlertStore::connect(&config.db_path)
                .await
                .with_context(|| {
                    format!(
                        "Failed to open moderation database at {}",
                        config.db_path.display()
                    )
                })?;
            tracing::debug!(path = %config.db_path.display(), "Using SQLite alert store");
            let service = ModerationService::new(store, config.safety);
            run_with_service(cli.command, &service).await
        }
    }
}
