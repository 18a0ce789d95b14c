use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::cargo::{finished, step, OnFailure};
use crate::TARGET;

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking builds...".cyan().bold());
    println!();

    let start = Instant::now();

    step(
        "Hardware target (STM32F103)",
        &[
            "check", "-p", "firmware", "--target", TARGET, "--features", "hardware",
        ],
        OnFailure::Bail,
    )?;

    step(
        "Emulator target (host)",
        &["check", "-p", "firmware", "--features", "emulator", "--examples"],
        OnFailure::Bail,
    )?;

    // Core crates must stay no_std.
    step(
        "Platform and diagnostics (no_std)",
        &[
            "check",
            "-p",
            "platform",
            "-p",
            "diagnostics",
            "--target",
            TARGET,
            "--no-default-features",
        ],
        OnFailure::Bail,
    )?;

    step(
        "Clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        OnFailure::Warn,
    )?;

    if step("Formatting", &["fmt", "--all", "--check"], OnFailure::Warn)?.is_none() {
        eprintln!("     Run 'cargo fmt --all' to fix");
    }

    finished("All checks", start);
    Ok(())
}
