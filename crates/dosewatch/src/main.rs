// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dosewatch - a medication reminder dispatch service.
//!
//! This is the binary entry point: prescriptions come in as extracted
//! records, schedules live in SQLite, and per-destination background
//! schedulers deliver WhatsApp reminders.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod ingest;
mod meds;
mod profile;
mod serve;
mod status;

/// Dosewatch - a medication reminder dispatch service.
#[derive(Parser, Debug)]
#[command(name = "dosewatch", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start reminder schedulers for every configured profile.
    Serve,
    /// Show profiles, schedules, and today's delivery activity.
    Status,
    /// Manage user profiles (reminder destinations).
    Profile {
        #[command(subcommand)]
        action: profile::ProfileAction,
    },
    /// Manage medication entries manually.
    Meds {
        #[command(subcommand)]
        action: meds::MedsAction,
    },
    /// Ingest an extracted prescription (JSON from the OCR pipeline).
    Ingest {
        /// User the prescription belongs to.
        user: String,
        /// Path to the extractor's JSON output.
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match dosewatch_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            dosewatch_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status) => status::run_status(config).await,
        Some(Commands::Profile { action }) => profile::run_profile(config, action).await,
        Some(Commands::Meds { action }) => meds::run_meds(config, action).await,
        Some(Commands::Ingest { user, file }) => ingest::run_ingest(config, &user, &file).await,
        None => {
            println!("dosewatch: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        super::Cli::command().debug_assert();
    }
}
