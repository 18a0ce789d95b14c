use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;

/// Launch the host supervisor example with the given knobs.
///
/// Output is streamed, not captured: the example logs every console line.
pub fn run(cycles: u32, debug_level: u8, fail_at: Option<&str>) -> Result<()> {
    println!();
    println!("{}", "🖥  Starting host supervisor...".cyan().bold());
    println!(
        "   {}",
        format!("cycles={cycles} debug_level={debug_level}").dimmed()
    );
    println!();

    let mut cmd = Command::new("cargo");
    cmd.args([
        "run",
        "-p",
        "firmware",
        "--example",
        "host_supervisor",
        "--features",
        "emulator",
    ])
    .env("CYCLES", cycles.to_string())
    .env("DEBUG_LEVEL", debug_level.to_string());
    if let Some(step) = fail_at {
        cmd.env("FAIL_AT", step);
    }

    let status = cmd.status().context("Failed to launch host supervisor")?;
    if !status.success() {
        anyhow::bail!("Host supervisor exited with {status}");
    }
    Ok(())
}
