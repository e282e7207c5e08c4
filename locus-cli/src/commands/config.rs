//! Config command - show configuration or write the default file.

use std::path::PathBuf;

use console::style;
use locus::config::ConfigFile;

use crate::error::CliError;
use crate::runner::load_config;

/// Run the config command.
pub fn run(config_path: Option<PathBuf>, init: bool) -> Result<(), CliError> {
    if init {
        return run_init(config_path);
    }
    run_show(config_path)
}

fn run_init(config_path: Option<PathBuf>) -> Result<(), CliError> {
    let path = config_path.unwrap_or_else(locus::config::config_file_path);
    if ConfigFile::ensure_exists(&path)? {
        println!("{} {}", style("Created").green(), path.display());
    } else {
        println!("{} {}", style("Already exists:").yellow(), path.display());
    }
    Ok(())
}

fn run_show(config_path: Option<PathBuf>) -> Result<(), CliError> {
    let (path, config) = load_config(config_path.as_deref())?;

    println!("Configuration: {}", style(path.display()).cyan());
    if !path.exists() {
        println!("(file not found, showing defaults)");
    }
    println!();

    println!("{}", style("[tracking]").bold());
    println!("  reattach_grace_ms = {}", config.tracking.reattach_grace_ms);
    println!("  indicator_title = {}", config.tracking.indicator_title);
    println!();
    println!("{}", style("[preferences]").bold());
    println!("  file = {}", config.preferences.file.display());
    println!();
    println!("{}", style("[logging]").bold());
    println!("  file = {}", config.logging.file.display());
    println!();
    println!("{}", style("[simulation]").bold());
    println!("  latitude = {}", config.simulation.latitude);
    println!("  longitude = {}", config.simulation.longitude);
    println!("  step_deg = {}", config.simulation.step_deg);
    println!("  heading_deg = {}", config.simulation.heading_deg);

    Ok(())
}
