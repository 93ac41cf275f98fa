//! PatchX CLI
//!
//! Command-line interface for applying declarative configuration patches

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use patchx_core::errors::PatchError;
use patchx_core::logging_facility::{init, Profile};
use patchx_engine::{EXIT_FAILURE, EXIT_OK};
use std::path::PathBuf;

mod commands;
mod config;

use config::{FlagOverrides, Settings};

#[derive(Debug, Parser)]
#[command(name = "patchx")]
#[command(about = "PatchX - Expectation-guarded configuration patches", long_about = None)]
struct Cli {
    /// Settings file (defaults to .patchx/patchx.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite store path
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Log profile: development, production or test
    #[arg(long = "log", global = true)]
    log_profile: Option<Profile>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate a patch against the store and apply it
    Apply(commands::patch::PatchArgs),
    /// Validate a patch and report what apply would do, without writing
    Plan(commands::patch::PatchArgs),
    /// Load and check a patch document without touching a store
    Validate(commands::patch::ValidateArgs),
    /// Inspect or seed the store directly
    Store(commands::store::StoreArgs),
}

fn run(cli: Cli) -> Result<(), PatchError> {
    let settings = Settings::resolve(FlagOverrides {
        config: cli.config,
        store: cli.store,
        log_profile: cli.log_profile,
    })?;
    init(settings.log_profile);

    match cli.command {
        Commands::Apply(args) => {
            commands::patch::execute(args, commands::patch::Mode::Apply, &settings)
        }
        Commands::Plan(args) => {
            commands::patch::execute(args, commands::patch::Mode::Plan, &settings)
        }
        Commands::Validate(args) => commands::patch::execute_validate(args),
        Commands::Store(args) => commands::store::execute(args, &settings),
    }
}

fn main() {
    // clap exits 2 on usage errors, which is the patch parse-error code here
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_OK,
                _ => EXIT_FAILURE,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(patchx_engine::exit_code(&e));
    }
}
