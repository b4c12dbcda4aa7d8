// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OmniVault daemon binary.
//!
//! Runs the secret-store daemon in the foreground until SIGINT/SIGTERM or
//! an IPC `/stop` request. Exits 0 on clean shutdown, non-zero when startup
//! fails (e.g. the endpoint cannot be bound).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use omnivault_config::{loader, Paths};
use omnivault_daemon::{install_signal_handler, Daemon};

/// OmniVault - a local encrypted secret store daemon.
#[derive(Parser, Debug)]
#[command(name = "omnivaultd", version, about, long_about = None)]
struct Cli {
    /// Path to an explicit config file (default: XDG hierarchy).
    #[arg(long)]
    config: Option<PathBuf>,

    /// State directory holding the vault and endpoint files
    /// (default: ~/.omnivault).
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Override the auto-lock timeout in seconds.
    #[arg(long)]
    auto_lock_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => loader::load_config_from_path(path),
        None => loader::load_config(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(secs) = cli.auto_lock_secs {
        config.daemon.auto_lock_secs = secs;
    }

    init_tracing(&config.daemon.log_level);

    let paths = match &cli.dir {
        Some(dir) => Paths::in_dir(dir, config.daemon.tcp_port),
        None => Paths::new(config.daemon.tcp_port),
    };

    let daemon = Daemon::new(paths, &config);
    let cancel = install_signal_handler();

    match daemon.run(cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "daemon failed");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,omnivault_store={log_level},omnivault_daemon={log_level},omnivault_config={log_level},omnivaultd={log_level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
