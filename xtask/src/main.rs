// Desktop/tooling crate — unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod cargo;
mod check;
mod flash;
mod run;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Cross-compilation target of the coprocessor (Cortex-M3, no FPU).
pub const TARGET: &str = "thumbv7m-none-eabi";

/// probe-rs chip name.
pub const CHIP: &str = "STM32F103C8";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "IO coprocessor development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check hardware and emulator builds, lints and formatting
    Check,
    /// Run unit, integration and doc tests
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
    /// Flash firmware to the STM32F103 via probe-rs
    Flash {
        /// Build and flash release version
        #[arg(short, long)]
        release: bool,
    },
    /// Run the host supervisor on the desktop
    Run {
        /// Cycles before exiting
        #[arg(long, default_value_t = 500)]
        cycles: u32,
        /// Diagnostic verbosity
        #[arg(long, default_value_t = 1)]
        debug_level: u8,
        /// Bring-up step to fail (e.g. init_safety)
        #[arg(long)]
        fail_at: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => check::run(),
        Commands::Test { unit, integration } => test::run(unit, integration),
        Commands::Flash { release } => flash::run(release),
        Commands::Run {
            cycles,
            debug_level,
            fail_at,
        } => run::run(cycles, debug_level, fail_at.as_deref()),
    }
}
