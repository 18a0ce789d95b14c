use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

use crate::cargo::{step, OnFailure};
use crate::{CHIP, TARGET};

pub fn run(release: bool) -> Result<()> {
    let profile = if release { "release" } else { "debug" };

    println!();
    println!(
        "{}",
        format!("🔨 Building firmware ({profile} mode)...").cyan().bold()
    );
    println!();

    let mut build = vec!["build", "-p", "firmware", "--target", TARGET, "--features", "hardware"];
    if release {
        build.push("--release");
    }
    step("Firmware build", &build, OnFailure::Bail)?;

    let binary = format!("target/{TARGET}/{profile}/firmware");
    show_binary_size(&binary);

    println!("{}", format!("📡 Flashing to {CHIP}...").cyan().bold());
    println!("   {}", "Connecting to probe...".dimmed());

    let flash_start = Instant::now();
    let flash_output = Command::new("probe-rs")
        .args(["run", &binary, "--chip", CHIP, "--probe-index", "0"])
        .output()
        .context("Failed to run probe-rs. Is probe-rs installed? (cargo install probe-rs-tools)")?;

    if !flash_output.status.success() {
        eprintln!("{}", "✗ Flash failed".red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&flash_output.stderr));
        anyhow::bail!("Flash failed - check that the probe is connected and the board is powered");
    }

    println!(
        "{}",
        format!(
            "✓ Flash successful in {:.2}s",
            flash_start.elapsed().as_secs_f64()
        )
        .green()
    );
    println!();
    println!(
        "   {}",
        format!("Use 'probe-rs attach --chip {CHIP} {binary}' to view RTT logs").dimmed()
    );
    println!();

    Ok(())
}

/// Best effort: silently skipped when `rust-size` is not installed.
fn show_binary_size(binary: &str) {
    let Ok(output) = Command::new("rust-size").args([binary, "-A"]).output() else {
        return;
    };
    if !output.status.success() {
        return;
    }
    println!("{}", "📊 Binary size:".cyan());
    for line in String::from_utf8_lossy(&output.stdout).lines() {
        println!("   {}", line.dimmed());
    }
    println!();
}
